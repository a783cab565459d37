//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::instrument::{PassTiming, TimingReport};
use crate::ir::Module;
use crate::pass::*;
use crate::transforms::{FunctionVerifierPass, ModuleVerifierPass};
use std::fmt;

/// Bookkeeping that is only needed while a pipeline is being built.
///
/// Function passes that are added back-to-back share one adaptor, `open`
/// is the index (in the root executor) of the adaptor that the next function
/// pass will be added to.
#[derive(Debug, Default)]
pub(crate) struct PipelineBuilder {
    verify: bool,
    open: Option<usize>,
}

impl PipelineBuilder {
    pub(crate) fn new(verify: bool) -> Self {
        Self { verify, open: None }
    }

    pub(crate) fn add_pass(&mut self, root: &mut ModulePassExecutor, pass: Pass) {
        match pass {
            Pass::Module(pass) => self.add_module_pass(root, pass),
            Pass::Function(pass) => self.add_function_pass(root, pass),
        }
    }

    pub(crate) fn close(&mut self) {
        self.open = None;
    }

    fn add_module_pass(&mut self, root: &mut ModulePassExecutor, pass: Box<dyn ModulePass>) {
        self.close();

        root.add_pass(pass);

        if self.verify {
            root.add_pass(Box::new(ModuleVerifierPass));
        }
    }

    fn add_function_pass(&mut self, root: &mut ModulePassExecutor, pass: Box<dyn FunctionPass>) {
        let index = match self.open {
            Some(index) => index,
            None => {
                let index = root.len();

                self.add_module_pass(root, Box::new(ModuleToFunctionPassAdaptor::new()));
                self.open = Some(index);

                index
            }
        };

        // `open` only ever points at an adaptor we pushed ourselves
        let nested = root
            .pass_mut(index)
            .and_then(|adaptor| adaptor.function_executor_mut())
            .unwrap_or_else(|| unreachable!("open pipeline index does not refer to an adaptor"));

        nested.add_pass(pass);

        if self.verify {
            nested.add_pass(Box::new(FunctionVerifierPass));
        }
    }
}

/// Manages building and running a pipeline of passes over a module.
///
/// Passes of either granularity can be added in any order. Function passes
/// are grouped into [`ModuleToFunctionPassAdaptor`]s automatically: every
/// function pass added right after another function pass runs in the same
/// adaptor, so the whole group runs over one function before moving to the next.
///
/// If verification is enabled, a verifier is added after every pass (including
/// after each adaptor).
///
/// ```
/// # use garnet::pass::*;
/// # use garnet::transforms::*;
/// let mut pm = PassManager::new(true);
///
/// pm.add_module_pass(GlobalDeadCodeEliminationPass);
/// pm.add_function_pass(ConstantFoldPass);
/// pm.add_function_pass(DeadCodeEliminationPass);
///
/// assert_eq!(
///     pm.to_string(),
///     "globaldce,verify-module,function(constfold,verify-function,dce,verify-function),verify-module"
/// );
/// ```
pub struct PassManager {
    passes: ModulePassExecutor,
    builder: PipelineBuilder,
    instrumentor: Option<PassInstrumentor>,
}

impl PassManager {
    /// Creates an empty pass manager. If `verify` is true, verifier
    /// passes are inserted after every pass that is added.
    pub fn new(verify: bool) -> Self {
        Self {
            passes: ModulePassExecutor::new(),
            builder: PipelineBuilder::new(verify),
            instrumentor: None,
        }
    }

    /// Checks whether verifiers are being inserted.
    pub fn verifies(&self) -> bool {
        self.builder.verify
    }

    /// Adds a pass to the end of the pipeline, taking ownership of it.
    pub fn add_pass(&mut self, pass: Pass) {
        self.builder.add_pass(&mut self.passes, pass);
    }

    /// Adds a function pass to the end of the pipeline.
    pub fn add_function_pass<P: FunctionPass + 'static>(&mut self, pass: P) {
        self.add_pass(Pass::function(pass));
    }

    /// Adds a module pass to the end of the pipeline.
    pub fn add_module_pass<P: ModulePass + 'static>(&mut self, pass: P) {
        self.add_pass(Pass::module(pass));
    }

    /// Ends the current group of function passes, the next function pass will
    /// be put into a new adaptor.
    pub fn end_function_pipeline(&mut self) {
        self.builder.close();
    }

    /// Registers an instrumentation that is notified around every pass that runs.
    pub fn add_instrumentation<I: PassInstrumentation + 'static>(&mut self, instrumentation: I) {
        self.instrumentor
            .get_or_insert_with(PassInstrumentor::new)
            .add_instrumentation(instrumentation);
    }

    /// Enables timing of every pass. The returned report is filled in as the
    /// pipeline runs.
    pub fn enable_timing(&mut self) -> TimingReport {
        let timing = PassTiming::new();
        let report = timing.report();

        self.add_instrumentation(timing);

        report
    }

    /// Gets the top-level passes of the pipeline.
    pub fn passes(&self) -> &ModulePassExecutor {
        &self.passes
    }

    /// Runs the entire pipeline over `module`.
    ///
    /// Every analysis computed during the run is dropped when this returns.
    pub fn run(&mut self, module: &mut Module) -> Result<(), PipelineFailure> {
        let am = ModuleAnalysisManager::new(module, self.instrumentor.as_ref());

        tracing::info!(module = module.name(), pipeline = %self.passes, "running pipeline");

        let result = self.passes.run(module, &am);

        match &result {
            Ok(()) => tracing::info!(module = module.name(), "pipeline finished"),
            Err(failure) => tracing::info!(module = module.name(), %failure, "pipeline failed"),
        }

        result
    }
}

impl fmt::Debug for PassManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManager")
            .field("passes", &self.passes)
            .field("builder", &self.builder)
            .field("instrumentor", &self.instrumentor)
            .finish()
    }
}

impl fmt::Display for PassManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.passes)
    }
}
