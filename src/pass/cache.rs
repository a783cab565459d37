//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::pass::{AnalysisKind, PreservedAnalyses};
use crate::utility::SaHashMap;
use std::any::Any;
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// A cache of analysis results for exactly one IR unit.
///
/// Results are computed lazily the first time they are requested, and are
/// shared out as `Rc`s so that a pass can hold on to one result while requesting
/// another. Invalidation only ever drops the cache's reference, anyone still
/// holding an old result keeps a (stale) copy alive until they drop it.
///
/// The cache uses interior mutability, the pass infrastructure is strictly
/// single-threaded and an analysis being computed may request other analyses
/// from the same cache.
#[derive(Default)]
pub struct AnalysisCache {
    entries: RefCell<SaHashMap<AnalysisKind, Rc<dyn Any>>>,
}

impl AnalysisCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cached result for `A`, or computes it with `compute`, caches it, and
    /// returns it.
    ///
    /// No borrow of the cache is held while `compute` runs, so it is free to
    /// request other analyses from this same cache.
    pub fn get_or_compute<A: Any>(&self, compute: impl FnOnce() -> A) -> Rc<A> {
        if let Some(result) = self.get_cached::<A>() {
            return result;
        }

        let kind = AnalysisKind::of::<A>();
        let result = Rc::new(compute());

        tracing::trace!(analysis = kind.name(), "computed analysis");

        self.entries
            .borrow_mut()
            .insert(kind, Rc::clone(&result) as Rc<dyn Any>);

        result
    }

    /// Gets the result for `A` only if it is already cached.
    pub fn get_cached<A: Any>(&self) -> Option<Rc<A>> {
        let entries = self.entries.borrow();
        let result = entries.get(&AnalysisKind::of::<A>())?;

        // entries are keyed by the `TypeId` of their own type, the downcast can't fail
        match Rc::clone(result).downcast::<A>() {
            Ok(result) => Some(result),
            Err(_) => unreachable!("analysis cache entry has the wrong type"),
        }
    }

    /// Checks whether a result for `kind` is cached.
    pub fn contains(&self, kind: AnalysisKind) -> bool {
        self.entries.borrow().contains_key(&kind)
    }

    /// Drops every cached result whose kind is not preserved by `preserved`.
    ///
    /// This only ever walks the results currently in the cache.
    pub fn invalidate(&self, preserved: &PreservedAnalyses) {
        if preserved.is_all() {
            return;
        }

        if preserved.is_none() {
            self.clear();
            return;
        }

        let mut entries = self.entries.borrow_mut();
        let before = entries.len();

        entries.retain(|kind, _| preserved.is_preserved(*kind));

        tracing::debug!(
            dropped = before - entries.len(),
            kept = entries.len(),
            "invalidated analyses"
        );
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        let mut entries = self.entries.borrow_mut();

        if !entries.is_empty() {
            tracing::debug!(dropped = entries.len(), "cleared analysis cache");
        }

        entries.clear();
    }

    /// Gets the number of cached results.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Checks if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Gets the kinds of every cached result, in no particular order.
    pub fn kinds(&self) -> Vec<AnalysisKind> {
        self.entries.borrow().keys().copied().collect()
    }
}

impl Debug for AnalysisCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        let mut set = f.debug_set();

        for kind in entries.keys() {
            set.entry(&kind.name());
        }

        set.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct A(u32);
    struct B(u32);
    struct C(u32);

    fn filled() -> AnalysisCache {
        let cache = AnalysisCache::new();

        cache.get_or_compute(|| A(1));
        cache.get_or_compute(|| B(2));
        cache.get_or_compute(|| C(3));

        cache
    }

    #[test]
    fn invalidate_all_keeps_everything() {
        let cache = filled();

        cache.invalidate(&PreservedAnalyses::all());

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn invalidate_none_drops_everything() {
        let cache = filled();

        cache.invalidate(&PreservedAnalyses::none());

        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_set_keeps_exactly_the_set() {
        let cache = filled();

        cache.invalidate(&PreservedAnalyses::none().with::<B>());

        assert_eq!(cache.kinds(), vec![AnalysisKind::of::<B>()]);
        assert_eq!(cache.get_cached::<B>().unwrap().0, 2);
        assert!(cache.get_cached::<A>().is_none());
        assert!(cache.get_cached::<C>().is_none());
    }

    #[test]
    fn computes_lazily_and_once() {
        let cache = AnalysisCache::new();
        let runs = Cell::new(0);

        assert!(cache.get_cached::<A>().is_none());

        for _ in 0..3 {
            let a = cache.get_or_compute(|| {
                runs.set(runs.get() + 1);
                A(7)
            });

            assert_eq!(a.0, 7);
        }

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn recomputes_after_invalidation() {
        let cache = filled();

        cache.invalidate(&PreservedAnalyses::none());

        assert_eq!(cache.get_or_compute(|| A(10)).0, 10);
    }

    #[test]
    fn compute_may_request_other_analyses() {
        let cache = AnalysisCache::new();

        let b = cache.get_or_compute(|| {
            let a = cache.get_or_compute(|| A(20));

            B(a.0 + 1)
        });

        assert_eq!(b.0, 21);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn old_results_outlive_invalidation() {
        let cache = filled();
        let a = cache.get_cached::<A>().unwrap();

        cache.clear();

        assert_eq!(a.0, 1);
        assert!(cache.is_empty());
    }
}
