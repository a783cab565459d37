//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use smallvec::SmallVec;
use std::any::{self, Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a single type of analysis.
///
/// This is the [`TypeId`] of the analysis result type, the type name is only
/// carried along for diagnostics and never participates in comparisons.
#[derive(Copy, Clone)]
pub struct AnalysisKind {
    id: TypeId,
    name: &'static str,
}

impl AnalysisKind {
    /// Gets the kind for the analysis `T`.
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// Gets the fully-qualified type name of the analysis.
    #[inline]
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for AnalysisKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnalysisKind {}

impl PartialOrd for AnalysisKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnalysisKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for AnalysisKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisKind({})", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Preserved {
    All,
    // sorted so we can binary_search for `contains`. empty means "none"
    Some(SmallVec<[AnalysisKind; 2]>),
}

/// Models the set of analyses that a given transformation pass
/// preserves.
///
/// This is not a contract that is checked, it is expected that the transform knows what
/// analyses it can preserve. If it reports incorrectly, stale analysis results
/// can be handed to later passes.
///
/// The default is [`Self::none`], a pass that says nothing is assumed to have
/// changed everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedAnalyses {
    preserved: Preserved,
}

impl PreservedAnalyses {
    /// Returns a [`PreservedAnalyses`] that marks every analysis as preserved.
    pub fn all() -> Self {
        Self {
            preserved: Preserved::All,
        }
    }

    /// Returns a [`PreservedAnalyses`] that marks every analysis as invalidated.
    pub fn none() -> Self {
        Self {
            preserved: Preserved::Some(SmallVec::new()),
        }
    }

    /// Checks if *all* analyses are preserved. If this is true, the transformation
    /// effectively reports to have not changed *anything* in the IR.
    ///
    /// This cannot be obtained in any way except [`Self::all`].
    pub fn is_all(&self) -> bool {
        matches!(self.preserved, Preserved::All)
    }

    /// Checks if *no* analyses are preserved.
    pub fn is_none(&self) -> bool {
        matches!(&self.preserved, Preserved::Some(kinds) if kinds.is_empty())
    }

    /// Reports that the analysis `T` is preserved by the current transformation.
    pub fn preserve<T: Any>(&mut self) {
        self.preserve_kind(AnalysisKind::of::<T>())
    }

    /// Builder-style version of [`Self::preserve`].
    pub fn with<T: Any>(mut self) -> Self {
        self.preserve::<T>();
        self
    }

    /// Reports that an analysis is preserved by the current transformation.
    ///
    /// This does nothing if every analysis is already preserved.
    pub fn preserve_kind(&mut self, kind: AnalysisKind) {
        if let Preserved::Some(kinds) = &mut self.preserved {
            if let Err(pos) = kinds.binary_search(&kind) {
                kinds.insert(pos, kind);
            }
        }
    }

    /// Checks if an analysis is preserved. If all are preserved
    /// or the kind has been preserved with [`Self::preserve`], this returns `true`.
    pub fn is_preserved(&self, kind: AnalysisKind) -> bool {
        match &self.preserved {
            Preserved::All => true,
            Preserved::Some(kinds) => kinds.binary_search(&kind).is_ok(),
        }
    }
}

impl Default for PreservedAnalyses {
    fn default() -> Self {
        Self::none()
    }
}
