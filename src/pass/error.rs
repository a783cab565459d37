//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::pass::{IrUnit, PreservedAnalyses};
use thiserror::Error;

/// What a pass returns from its entry point.
///
/// `Ok` carries the analyses that the pass preserved. `Err` means the pass was
/// unable to produce valid output, the rest of the pipeline is skipped.
pub type PassResult = Result<PreservedAnalyses, PassFailure>;

/// Returned by a pass that could not complete.
///
/// A failing pass still declares what it preserved, this defaults to
/// [`PreservedAnalyses::none`] since a failed pass may have left the IR
/// partially transformed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PassFailure {
    message: String,
    preserved: PreservedAnalyses,
    nested: Option<Box<PipelineFailure>>,
}

impl PassFailure {
    /// Creates a failure with a human-readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            preserved: PreservedAnalyses::none(),
            nested: None,
        }
    }

    /// Declares the analyses that are still valid despite the failure.
    pub fn preserving(mut self, preserved: PreservedAnalyses) -> Self {
        self.preserved = preserved;
        self
    }

    /// Gets the reason the pass failed.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the analyses preserved by the failing pass.
    pub fn preserved(&self) -> &PreservedAnalyses {
        &self.preserved
    }

    // used by passes that run other passes, the innermost failure is
    // what ends up being reported to the caller of `PassManager::run`
    pub(crate) fn nested(inner: PipelineFailure) -> Self {
        Self {
            message: inner.to_string(),
            preserved: PreservedAnalyses::none(),
            nested: Some(Box::new(inner)),
        }
    }
}

/// Returned by [`PassManager::run`](crate::pass::PassManager::run) when the pipeline
/// did not complete.
///
/// This names the innermost pass that failed, the IR unit it failed on, and why.
/// The IR reflects every pass that completed before the failing one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pass `{pass}` failed on {unit}: {message}")]
pub struct PipelineFailure {
    pass: String,
    unit: String,
    message: String,
}

impl PipelineFailure {
    pub(crate) fn new(pass: &str, unit: IrUnit<'_>, failure: PassFailure) -> Self {
        match failure.nested {
            Some(inner) => *inner,
            None => Self {
                pass: pass.to_owned(),
                unit: unit.to_string(),
                message: failure.message,
            },
        }
    }

    /// Gets the name of the pass that failed.
    pub fn pass(&self) -> &str {
        &self.pass
    }

    /// Gets a description of the IR unit the pass failed on, e.g. `function @main`.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Gets the reason the pass gave for failing.
    pub fn message(&self) -> &str {
        &self.message
    }
}
