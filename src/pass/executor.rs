//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Function, Module};
use crate::pass::transform::{run_function_pass, run_module_pass};
use crate::pass::*;
use std::fmt;

/// An ordered list of function passes that are run one after another over
/// the same function.
///
/// The first pass that fails stops the list, nothing after it runs.
#[derive(Default)]
pub struct FunctionPassExecutor {
    passes: Vec<Box<dyn FunctionPass>>,
}

impl FunctionPassExecutor {
    /// Creates a new, empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pass to the end of the list.
    pub fn add_pass(&mut self, pass: Box<dyn FunctionPass>) {
        self.passes.push(pass);
    }

    /// Gets the names of every pass, in the order they run.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Gets the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Checks if there are no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs every pass over `func` in order, stopping at the first failure.
    pub fn run(&mut self, func: &mut Function, am: &FunctionAnalysisManager<'_>) -> Result<(), PipelineFailure> {
        for pass in self.passes.iter_mut() {
            run_function_pass(pass.as_mut(), func, am)?;
        }

        Ok(())
    }
}

impl fmt::Debug for FunctionPassExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pass_names()).finish()
    }
}

impl fmt::Display for FunctionPassExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.pass_names().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }

            write!(f, "{name}")?;
        }

        Ok(())
    }
}

/// An ordered list of module passes that are run one after another over
/// the same module.
///
/// The first pass that fails stops the list, nothing after it runs.
#[derive(Default)]
pub struct ModulePassExecutor {
    passes: Vec<Box<dyn ModulePass>>,
}

impl ModulePassExecutor {
    /// Creates a new, empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pass to the end of the list.
    pub fn add_pass(&mut self, pass: Box<dyn ModulePass>) {
        self.passes.push(pass);
    }

    /// Gets the pass at `index` if it exists.
    pub fn pass(&self, index: usize) -> Option<&dyn ModulePass> {
        self.passes.get(index).map(|pass| pass.as_ref())
    }

    /// Gets the pass at `index` if it exists.
    pub fn pass_mut(&mut self, index: usize) -> Option<&mut (dyn ModulePass + 'static)> {
        self.passes.get_mut(index).map(|pass| pass.as_mut())
    }

    /// Gets the names of every pass, in the order they run.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Gets the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Checks if there are no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs every pass over `module` in order, stopping at the first failure.
    pub fn run(&mut self, module: &mut Module, am: &ModuleAnalysisManager<'_>) -> Result<(), PipelineFailure> {
        for pass in self.passes.iter_mut() {
            run_module_pass(pass.as_mut(), module, am)?;
        }

        Ok(())
    }
}

impl fmt::Debug for ModulePassExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pass_names()).finish()
    }
}

impl fmt::Display for ModulePassExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pass) in self.passes.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }

            match pass.function_executor() {
                Some(nested) => write!(f, "{}({nested})", pass.name())?,
                None => write!(f, "{}", pass.name())?,
            }
        }

        Ok(())
    }
}

/// Adapts a function pipeline into a module pass that runs the pipeline
/// over every function with a body, in declaration order.
///
/// After the pipeline finishes with a function, every analysis cached for it
/// is dropped. The function's slice stays around (empty) in the module manager.
#[derive(Debug, Default)]
pub struct ModuleToFunctionPassAdaptor {
    executor: FunctionPassExecutor,
}

impl ModuleToFunctionPassAdaptor {
    /// Creates an adaptor with an empty function pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adaptor around an existing function pipeline.
    pub fn adapt(executor: FunctionPassExecutor) -> Self {
        Self { executor }
    }

    /// Gets the nested pipeline.
    pub fn executor(&self) -> &FunctionPassExecutor {
        &self.executor
    }

    /// Gets the nested pipeline.
    pub fn executor_mut(&mut self) -> &mut FunctionPassExecutor {
        &mut self.executor
    }
}

impl ModulePass for ModuleToFunctionPassAdaptor {
    fn name(&self) -> &str {
        "function"
    }

    fn run_on_module(&mut self, module: &mut Module, am: &ModuleAnalysisManager<'_>) -> PassResult {
        for func in module.functions_mut() {
            if func.is_declaration() {
                continue;
            }

            let fam = am.slice(func);

            self.executor.run(func, &fam).map_err(PassFailure::nested)?;

            fam.clear();
        }

        Ok(PreservedAnalyses::none())
    }

    fn function_executor(&self) -> Option<&FunctionPassExecutor> {
        Some(&self.executor)
    }

    fn function_executor_mut(&mut self) -> Option<&mut FunctionPassExecutor> {
        Some(&mut self.executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Linkage;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        log: Log,
    }

    impl PassInstrumentation for Recorder {
        fn before_pass(&mut self, pass: &str, unit: IrUnit<'_>) {
            self.log.borrow_mut().push(format!("before {pass} {}", unit.name()));
        }

        fn after_pass(&mut self, pass: &str, unit: IrUnit<'_>) {
            self.log.borrow_mut().push(format!("after {pass} {}", unit.name()));
        }

        fn after_pass_failed(&mut self, pass: &str, unit: IrUnit<'_>) {
            self.log.borrow_mut().push(format!("failed {pass} {}", unit.name()));
        }
    }

    struct Step {
        name: &'static str,
        fails: bool,
        runs: Rc<RefCell<u32>>,
    }

    impl FunctionPass for Step {
        fn name(&self) -> &str {
            self.name
        }

        fn run_on_function(&mut self, _: &mut Function, _: &FunctionAnalysisManager<'_>) -> PassResult {
            *self.runs.borrow_mut() += 1;

            if self.fails {
                Err(PassFailure::new("step failed"))
            } else {
                Ok(PreservedAnalyses::all())
            }
        }
    }

    struct Arity(u32);

    impl FunctionAnalysis for Arity {
        fn compute(func: &Function, _: &FunctionAnalysisManager<'_>) -> Self {
            Self(func.param_count())
        }
    }

    struct UsesArity {
        seen: Rc<RefCell<Vec<(String, usize)>>>,
    }

    impl FunctionPass for UsesArity {
        fn name(&self) -> &str {
            "uses-arity"
        }

        fn run_on_function(&mut self, func: &mut Function, am: &FunctionAnalysisManager<'_>) -> PassResult {
            am.get::<Arity>(func);

            self.seen.borrow_mut().push((func.name().to_owned(), am.len()));

            Ok(PreservedAnalyses::all())
        }
    }

    fn module_with(names: &[&str]) -> Module {
        let mut m = Module::new("test");

        m.declare_function("external", 1);

        for name in names {
            let mut b = m.define_function(name, 1, Linkage::Public);
            b.ret(None);
            b.define();
        }

        m
    }

    fn steps(fail_at: Option<usize>, count: usize) -> (FunctionPassExecutor, Vec<Rc<RefCell<u32>>>) {
        let mut executor = FunctionPassExecutor::new();
        let mut counters = Vec::default();

        for i in 0..count {
            let runs = Rc::new(RefCell::new(0));

            counters.push(Rc::clone(&runs));
            executor.add_pass(Box::new(Step {
                name: ["a", "b", "c", "d"][i],
                fails: fail_at == Some(i),
                runs,
            }));
        }

        (executor, counters)
    }

    #[test]
    fn executor_stops_at_first_failure() {
        let mut m = module_with(&["f"]);
        let log = Log::default();
        let mut pi = PassInstrumentor::new();

        pi.add_instrumentation(Recorder { log: Rc::clone(&log) });

        let (mut executor, counters) = steps(Some(1), 4);
        let mam = ModuleAnalysisManager::new(&m, Some(&pi));
        let f = m.find_function_by_name("f").unwrap();
        let func = m.function_mut(f);
        let fam = mam.slice(func);
        let failure = executor.run(func, &fam).unwrap_err();

        assert_eq!(failure.pass(), "b");
        assert_eq!(failure.unit(), "function @f");
        assert_eq!(failure.message(), "step failed");
        assert_eq!(
            counters.iter().map(|c| *c.borrow()).collect::<Vec<_>>(),
            vec![1, 1, 0, 0]
        );
        assert_eq!(
            *log.borrow(),
            vec!["before a f", "after a f", "before b f", "failed b f"]
        );
    }

    #[test]
    fn executor_runs_everything_on_success() {
        let mut m = module_with(&["f"]);
        let (mut executor, counters) = steps(None, 3);
        let mam = ModuleAnalysisManager::new(&m, None);
        let f = m.find_function_by_name("f").unwrap();
        let func = m.function_mut(f);
        let fam = mam.slice(func);

        assert!(executor.run(func, &fam).is_ok());
        assert!(counters.iter().all(|c| *c.borrow() == 1));
        assert_eq!(executor.to_string(), "a,b,c");
    }

    #[test]
    fn adaptor_visits_definitions_and_clears_caches() {
        let mut m = module_with(&["f", "g", "h"]);
        let seen = Rc::new(RefCell::new(Vec::default()));
        let mut adaptor = ModuleToFunctionPassAdaptor::new();

        adaptor.executor_mut().add_pass(Box::new(UsesArity { seen: Rc::clone(&seen) }));

        let mam = ModuleAnalysisManager::new(&m, None);
        let preserved = adaptor.run_on_module(&mut m, &mam).unwrap();

        assert!(preserved.is_none());
        assert_eq!(
            *seen.borrow(),
            vec![("f".to_owned(), 1), ("g".to_owned(), 1), ("h".to_owned(), 1)]
        );

        // one slice per definition, the declaration is never sliced
        assert_eq!(mam.slice_count(), 3);

        for func in m.iter().filter(|f| !f.is_declaration()) {
            assert!(mam.slice(func).is_empty());
        }
    }

    #[test]
    fn adaptor_reports_innermost_failure() {
        let mut m = module_with(&["f", "g"]);
        let (executor, counters) = steps(Some(0), 2);
        let mut adaptor = ModuleToFunctionPassAdaptor::adapt(executor);
        let mam = ModuleAnalysisManager::new(&m, None);
        let failure = run_module_pass(&mut adaptor, &mut m, &mam).unwrap_err();

        assert_eq!(failure.pass(), "a");
        assert_eq!(failure.unit(), "function @f");

        // `g` is never visited
        assert_eq!(*counters[0].borrow(), 1);
        assert_eq!(*counters[1].borrow(), 0);
    }

    struct Arity2(u32);

    impl FunctionAnalysis for Arity2 {
        fn compute(func: &Function, _: &FunctionAnalysisManager<'_>) -> Self {
            Self(func.param_count() * 2)
        }
    }

    // computes `Arity` and `Arity2`, then claims only `Arity` survived
    struct KeepsArity {
        fails: bool,
    }

    impl FunctionPass for KeepsArity {
        fn name(&self) -> &str {
            "keeps-arity"
        }

        fn run_on_function(&mut self, func: &mut Function, am: &FunctionAnalysisManager<'_>) -> PassResult {
            am.get::<Arity>(func);
            am.get::<Arity2>(func);

            let preserved = PreservedAnalyses::none().with::<Arity>();

            if self.fails {
                Err(PassFailure::new("keeps-arity failed").preserving(preserved))
            } else {
                Ok(preserved)
            }
        }
    }

    struct FunctionCount(usize);

    impl ModuleAnalysis for FunctionCount {
        fn compute(module: &Module, _: &ModuleAnalysisManager<'_>) -> Self {
            Self(module.function_count())
        }
    }

    struct DefinitionCount(usize);

    impl ModuleAnalysis for DefinitionCount {
        fn compute(module: &Module, _: &ModuleAnalysisManager<'_>) -> Self {
            Self(module.iter().filter(|f| !f.is_declaration()).count())
        }
    }

    struct KeepsFunctionCount {
        fails: bool,
    }

    impl ModulePass for KeepsFunctionCount {
        fn name(&self) -> &str {
            "keeps-function-count"
        }

        fn run_on_module(&mut self, module: &mut Module, am: &ModuleAnalysisManager<'_>) -> PassResult {
            am.get::<FunctionCount>(module);
            am.get::<DefinitionCount>(module);

            let preserved = PreservedAnalyses::none().with::<FunctionCount>();

            if self.fails {
                Err(PassFailure::new("keeps-function-count failed").preserving(preserved))
            } else {
                Ok(preserved)
            }
        }
    }

    #[test]
    fn function_runs_invalidate_what_was_not_preserved() {
        for fails in [false, true] {
            let mut m = module_with(&["f"]);
            let mam = ModuleAnalysisManager::new(&m, None);
            let f = m.find_function_by_name("f").unwrap();
            let func = m.function_mut(f);
            let fam = mam.slice(func);
            let mut executor = FunctionPassExecutor::new();

            executor.add_pass(Box::new(KeepsArity { fails }));

            assert_eq!(executor.run(func, &fam).is_err(), fails);
            assert_eq!(fam.get_cached::<Arity>().map(|a| a.0), Some(1));
            assert!(fam.get_cached::<Arity2>().is_none());
            assert_eq!(fam.len(), 1);
        }
    }

    #[test]
    fn module_runs_invalidate_what_was_not_preserved() {
        for fails in [false, true] {
            let mut m = module_with(&["f", "g"]);
            let mam = ModuleAnalysisManager::new(&m, None);
            let mut pass = KeepsFunctionCount { fails };
            let result = run_module_pass(&mut pass, &mut m, &mam);

            assert_eq!(result.is_err(), fails);
            assert_eq!(mam.get_cached::<FunctionCount>().map(|c| c.0), Some(3));
            assert!(mam.get_cached::<DefinitionCount>().is_none());
            assert_eq!(mam.analyses().len(), 1);
        }
    }

    #[test]
    fn failures_invalidate_everything_by_default() {
        let mut m = module_with(&["f"]);
        let mam = ModuleAnalysisManager::new(&m, None);
        let f = m.find_function_by_name("f").unwrap();
        let func = m.function_mut(f);
        let fam = mam.slice(func);
        let (mut executor, _) = steps(Some(0), 1);

        fam.get::<Arity>(func);

        assert!(executor.run(func, &fam).is_err());
        assert!(fam.is_empty());
    }

    #[test]
    fn module_executor_prints_nested_pipelines() {
        let (nested, _) = steps(None, 2);
        let mut executor = ModulePassExecutor::new();

        executor.add_pass(Box::new(ModuleToFunctionPassAdaptor::adapt(nested)));

        assert_eq!(executor.to_string(), "function(a,b)");
        assert_eq!(executor.len(), 1);
    }
}
