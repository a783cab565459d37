//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Func, Function, Module, ModuleIdentity};
use crate::pass::{AnalysisCache, PassInstrumentor, PreservedAnalyses};
use crate::utility::SaHashMap;
use std::any::Any;
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// An analysis that runs over a single function.
///
/// The analysis type is its own result: the first time a pass asks for `T`,
/// `T::compute` is called and the result is cached until a pass fails to
/// preserve `T`.
pub trait FunctionAnalysis: Any + Sized {
    /// Performs the analysis and returns a computed result. This should not be an impure
    /// operation, running the analysis twice on the same input should produce the same result.
    ///
    /// `am` can be used to request other analyses of the same function.
    fn compute(func: &Function, am: &FunctionAnalysisManager<'_>) -> Self;
}

/// An analysis that runs over an entire module.
pub trait ModuleAnalysis: Any + Sized {
    /// Performs the analysis and returns a computed result. This should not be an impure
    /// operation, running the analysis twice on the same input should produce the same result.
    fn compute(module: &Module, am: &ModuleAnalysisManager<'_>) -> Self;
}

/// A lazy analysis manager for a module.
///
/// This owns the cache for module analyses, and one cache per function
/// that has been [sliced](Self::slice). Function caches are created the first
/// time a function is sliced and live until they are invalidated away.
///
/// When a module pass completes, the analyses it preserves are passed to
/// [`Self::invalidate`], which applies the same set to the module cache and
/// to every function cache.
pub struct ModuleAnalysisManager<'a> {
    module: ModuleIdentity,
    analyses: AnalysisCache,
    functions: RefCell<SaHashMap<Func, Rc<AnalysisCache>>>,
    instrumentor: Option<&'a PassInstrumentor>,
}

impl<'a> ModuleAnalysisManager<'a> {
    /// Creates an empty manager bound to `module`.
    ///
    /// `instrumentor` is what every pass run under this manager (including
    /// function passes run on slices of it) reports to.
    pub fn new(module: &Module, instrumentor: Option<&'a PassInstrumentor>) -> Self {
        Self {
            module: module.identity(),
            analyses: AnalysisCache::new(),
            functions: RefCell::default(),
            instrumentor,
        }
    }

    /// Gets the identity of the module this manager is bound to.
    #[inline]
    pub fn module(&self) -> ModuleIdentity {
        self.module
    }

    /// Gets the instrumentor that passes should report to, if there is one.
    #[inline]
    pub fn instrumentor(&self) -> Option<&'a PassInstrumentor> {
        self.instrumentor
    }

    /// Lazily gets the result of an analysis. If the analysis has been invalidated,
    /// the result is re-computed, cached, and then returned.
    pub fn get<A: ModuleAnalysis>(&self, module: &Module) -> Rc<A> {
        debug_assert_eq!(module.identity(), self.module, "analyzing the wrong module");

        self.analyses.get_or_compute(|| A::compute(module, self))
    }

    /// Gets the result of an analysis only if it is already cached.
    pub fn get_cached<A: ModuleAnalysis>(&self) -> Option<Rc<A>> {
        self.analyses.get_cached::<A>()
    }

    /// Gets the cache of module-level analyses.
    #[inline]
    pub fn analyses(&self) -> &AnalysisCache {
        &self.analyses
    }

    /// Gets the analysis manager for a function in this module, creating an
    /// empty one if the function has not been sliced yet.
    ///
    /// Slicing the same function again returns a manager over the same cache,
    /// until that cache is dropped by an invalidation that preserves nothing.
    ///
    /// # Panics
    /// Panics if `func` belongs to a different module than this manager. That's
    /// a bug in the caller, not a problem with the IR.
    pub fn slice(&self, func: &Function) -> FunctionAnalysisManager<'_> {
        assert_eq!(
            func.module(),
            self.module,
            "function @{} has a different parent module",
            func.name()
        );

        let analyses = {
            let mut functions = self.functions.borrow_mut();
            let cache = functions.entry(func.func()).or_insert_with(|| {
                tracing::trace!(function = func.name(), "created function analysis slice");

                Rc::default()
            });

            Rc::clone(cache)
        };

        FunctionAnalysisManager {
            parent: self,
            func: func.func(),
            analyses,
        }
    }

    /// Gets the number of functions that currently have a slice.
    pub fn slice_count(&self) -> usize {
        self.functions.borrow().len()
    }

    /// Invalidates every analysis (module or function) not preserved by `preserved`.
    ///
    /// If nothing is preserved, every function slice is dropped outright
    /// instead of being emptied one by one.
    pub fn invalidate(&self, preserved: &PreservedAnalyses) {
        // if all analyses were preserved, then there is nothing to do here.
        if preserved.is_all() {
            return;
        }

        self.analyses.invalidate(preserved);

        let mut functions = self.functions.borrow_mut();

        if preserved.is_none() {
            if !functions.is_empty() {
                tracing::debug!(slices = functions.len(), "dropped function analysis slices");
            }

            functions.clear();
            return;
        }

        for cache in functions.values() {
            cache.invalidate(preserved);
        }
    }
}

impl Debug for ModuleAnalysisManager<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleAnalysisManager")
            .field("module", &self.module)
            .field("analyses", &self.analyses)
            .field("functions", &self.functions.borrow())
            .finish()
    }
}

/// A lazy analysis manager for a single function, obtained through
/// [`ModuleAnalysisManager::slice`].
///
/// It refers back to the module manager it was sliced from, which is how
/// function passes find the instrumentor and cached module analyses.
pub struct FunctionAnalysisManager<'a> {
    parent: &'a ModuleAnalysisManager<'a>,
    func: Func,
    analyses: Rc<AnalysisCache>,
}

impl<'a> FunctionAnalysisManager<'a> {
    /// Gets the function this manager caches analyses for.
    #[inline]
    pub fn func(&self) -> Func {
        self.func
    }

    /// Lazily gets the result of an analysis. If the analysis has been invalidated,
    /// the result is re-computed, cached, and then returned.
    pub fn get<A: FunctionAnalysis>(&self, func: &Function) -> Rc<A> {
        debug_assert_eq!(func.func(), self.func, "analyzing the wrong function");
        debug_assert_eq!(func.module(), self.parent.module, "analyzing the wrong function");

        self.analyses.get_or_compute(|| A::compute(func, self))
    }

    /// Gets the result of an analysis only if it is already cached.
    pub fn get_cached<A: FunctionAnalysis>(&self) -> Option<Rc<A>> {
        self.analyses.get_cached::<A>()
    }

    /// Gets the result of a module analysis only if it is already cached in the
    /// parent module manager.
    ///
    /// Function passes can't compute module analyses, the module may be in the middle
    /// of being transformed one function at a time.
    pub fn get_cached_module<A: ModuleAnalysis>(&self) -> Option<Rc<A>> {
        self.parent.get_cached::<A>()
    }

    /// Gets the instrumentor registered on the pass manager running this pipeline.
    #[inline]
    pub fn instrumentor(&self) -> Option<&'a PassInstrumentor> {
        self.parent.instrumentor()
    }

    /// Invalidates every analysis not preserved by `preserved`.
    pub fn invalidate(&self, preserved: &PreservedAnalyses) {
        self.analyses.invalidate(preserved)
    }

    /// Drops every analysis cached for this function.
    pub fn clear(&self) {
        self.analyses.clear()
    }

    /// Gets the number of cached analyses.
    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    /// Checks if nothing is cached for this function.
    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

impl Debug for FunctionAnalysisManager<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionAnalysisManager")
            .field("func", &self.func)
            .field("analyses", &self.analyses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Linkage;
    use std::cell::Cell;

    thread_local! {
        static PARAM_COUNT_RUNS: Cell<u32> = Cell::new(0);
    }

    struct ParamCount(u32);

    impl FunctionAnalysis for ParamCount {
        fn compute(func: &Function, _: &FunctionAnalysisManager<'_>) -> Self {
            PARAM_COUNT_RUNS.with(|runs| runs.set(runs.get() + 1));

            Self(func.param_count())
        }
    }

    struct DoubledParamCount(u32);

    impl FunctionAnalysis for DoubledParamCount {
        fn compute(func: &Function, am: &FunctionAnalysisManager<'_>) -> Self {
            Self(am.get::<ParamCount>(func).0 * 2)
        }
    }

    struct FunctionCount(usize);

    impl ModuleAnalysis for FunctionCount {
        fn compute(module: &Module, _: &ModuleAnalysisManager<'_>) -> Self {
            Self(module.function_count())
        }
    }

    fn module() -> (Module, Func, Func) {
        let mut m = Module::new("test");

        let mut b = m.define_function("first", 2, Linkage::Public);
        b.ret(None);
        let first = b.define();

        let mut b = m.define_function("second", 0, Linkage::Public);
        b.ret(None);
        let second = b.define();

        (m, first, second)
    }

    #[test]
    fn slicing_is_idempotent() {
        let (m, first, _) = module();
        let mam = ModuleAnalysisManager::new(&m, None);
        let func = m.function(first);

        let before = PARAM_COUNT_RUNS.with(Cell::get);
        let a = mam.slice(func).get::<ParamCount>(func);
        let b = mam.slice(func).get::<ParamCount>(func);

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(PARAM_COUNT_RUNS.with(Cell::get) - before, 1);
        assert_eq!(mam.slice_count(), 1);
        assert_eq!(mam.slice(func).len(), 1);
    }

    #[test]
    #[should_panic(expected = "has a different parent module")]
    fn slicing_foreign_function_panics() {
        let (m, first, _) = module();
        let other = Module::new("other");
        let mam = ModuleAnalysisManager::new(&other, None);

        let _ = mam.slice(m.function(first));
    }

    #[test]
    fn analyses_can_depend_on_other_analyses() {
        let (m, first, _) = module();
        let mam = ModuleAnalysisManager::new(&m, None);
        let func = m.function(first);
        let fam = mam.slice(func);

        assert_eq!(fam.get::<DoubledParamCount>(func).0, 4);
        assert!(fam.get_cached::<ParamCount>().is_some());
        assert_eq!(fam.len(), 2);
    }

    #[test]
    fn invalidate_all_keeps_slices() {
        let (m, first, second) = module();
        let mam = ModuleAnalysisManager::new(&m, None);

        mam.get::<FunctionCount>(&m);
        mam.slice(m.function(first)).get::<ParamCount>(m.function(first));
        mam.slice(m.function(second)).get::<ParamCount>(m.function(second));

        mam.invalidate(&PreservedAnalyses::all());

        assert!(mam.get_cached::<FunctionCount>().is_some());
        assert_eq!(mam.slice_count(), 2);
        assert_eq!(mam.slice(m.function(first)).len(), 1);
    }

    #[test]
    fn invalidate_none_drops_slices() {
        let (m, first, second) = module();
        let mam = ModuleAnalysisManager::new(&m, None);

        mam.get::<FunctionCount>(&m);
        mam.slice(m.function(first)).get::<ParamCount>(m.function(first));
        mam.slice(m.function(second)).get::<ParamCount>(m.function(second));

        mam.invalidate(&PreservedAnalyses::none());

        assert!(mam.analyses().is_empty());
        assert_eq!(mam.slice_count(), 0);
        assert!(mam.slice(m.function(first)).is_empty());
    }

    #[test]
    fn invalidate_set_applies_to_every_level() {
        let (m, first, _) = module();
        let mam = ModuleAnalysisManager::new(&m, None);
        let func = m.function(first);

        mam.get::<FunctionCount>(&m);
        mam.slice(func).get::<DoubledParamCount>(func);

        mam.invalidate(&PreservedAnalyses::none().with::<ParamCount>());

        let fam = mam.slice(func);

        assert!(mam.get_cached::<FunctionCount>().is_none());
        assert!(fam.get_cached::<ParamCount>().is_some());
        assert!(fam.get_cached::<DoubledParamCount>().is_none());
    }

    #[test]
    fn slices_see_cached_module_analyses() {
        let (m, first, _) = module();
        let mam = ModuleAnalysisManager::new(&m, None);
        let fam = mam.slice(m.function(first));

        assert!(fam.get_cached_module::<FunctionCount>().is_none());

        mam.get::<FunctionCount>(&m);

        assert_eq!(fam.get_cached_module::<FunctionCount>().unwrap().0, 2);
    }

    #[test]
    fn clearing_a_slice_keeps_the_entry() {
        let (m, first, _) = module();
        let mam = ModuleAnalysisManager::new(&m, None);
        let func = m.function(first);
        let fam = mam.slice(func);

        fam.get::<ParamCount>(func);
        fam.clear();

        assert!(fam.is_empty());
        assert_eq!(mam.slice_count(), 1);
        assert!(mam.slice(func).is_empty());
    }
}
