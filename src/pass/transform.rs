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
use crate::pass::*;
use static_assertions::assert_not_impl_any;
use std::fmt;

/// Defines a transformation over a single function.
///
/// While the pass may not actually modify the IR, it has the ability to, and needs to
/// declare what it changed (if anything) through [`PreservedAnalyses`].
pub trait FunctionPass {
    /// The name of the pass, as it appears in pipelines and diagnostics.
    fn name(&self) -> &str;

    /// Performs the transformation over a given function.
    ///
    /// This function is expected to act as-if it was pure, i.e. calling the same
    /// pass multiple times on the same IR should produce equivalent IR each time
    /// and should return the same preserved analyses each time.
    fn run_on_function(&mut self, func: &mut Function, am: &FunctionAnalysisManager<'_>) -> PassResult;
}

/// Models a pass that possibly performs a transformation over an entire module.
///
/// While the pass may not actually modify the IR, it has the ability to, and needs to
/// declare what it changed (if anything) through [`PreservedAnalyses`].
pub trait ModulePass {
    /// The name of the pass, as it appears in pipelines and diagnostics.
    fn name(&self) -> &str;

    /// Performs the transformation over a given module.
    ///
    /// This function is expected to act as-if it was pure, i.e. calling the same
    /// pass multiple times on the same IR should produce equivalent IR each time
    /// and should return the same preserved analyses each time.
    fn run_on_module(&mut self, module: &mut Module, am: &ModuleAnalysisManager<'_>) -> PassResult;

    /// If this pass runs a nested function pipeline, gets that pipeline.
    fn function_executor(&self) -> Option<&FunctionPassExecutor> {
        None
    }

    /// If this pass runs a nested function pipeline, gets that pipeline.
    fn function_executor_mut(&mut self) -> Option<&mut FunctionPassExecutor> {
        None
    }
}

/// Which granularity of IR a [`Pass`] runs over.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum PassKind {
    /// The pass runs over one function at a time.
    Function,
    /// The pass runs over an entire module.
    Module,
}

/// An owned pass of either granularity.
///
/// A pass is owned by exactly one executor once it has been added to a pipeline,
/// it can't be cloned or shared.
///
/// ```compile_fail
/// use garnet::pass::{Pass, PassManager};
/// use garnet::transforms::DeadCodeEliminationPass;
///
/// let pass = Pass::function(DeadCodeEliminationPass);
/// let mut pm = PassManager::new(false);
///
/// pm.add_pass(pass);
/// pm.add_pass(pass);
/// ```
pub enum Pass {
    /// A [`FunctionPass`].
    Function(Box<dyn FunctionPass>),
    /// A [`ModulePass`].
    Module(Box<dyn ModulePass>),
}

assert_not_impl_any!(Pass: Clone, Copy, Send, Sync);

impl Pass {
    /// Wraps a function pass.
    pub fn function<P: FunctionPass + 'static>(pass: P) -> Self {
        Self::Function(Box::new(pass))
    }

    /// Wraps a module pass.
    pub fn module<P: ModulePass + 'static>(pass: P) -> Self {
        Self::Module(Box::new(pass))
    }

    /// Gets the granularity of the pass.
    pub fn kind(&self) -> PassKind {
        match self {
            Self::Function(_) => PassKind::Function,
            Self::Module(_) => PassKind::Module,
        }
    }

    /// Gets the name of the pass.
    pub fn name(&self) -> &str {
        match self {
            Self::Function(pass) => pass.name(),
            Self::Module(pass) => pass.name(),
        }
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pass")
            .field(&self.kind())
            .field(&self.name())
            .finish()
    }
}

// every pass goes through one of these two so that instrumentation and
// invalidation happen exactly once per run, regardless of what the pass returns

pub(crate) fn run_function_pass(
    pass: &mut dyn FunctionPass,
    func: &mut Function,
    am: &FunctionAnalysisManager<'_>,
) -> Result<(), PipelineFailure> {
    let instrumentor = am.instrumentor();

    tracing::trace!(pass = pass.name(), function = func.name(), "running function pass");

    if let Some(pi) = instrumentor {
        pi.run_before_pass(pass.name(), IrUnit::Function(func));
    }

    let result = pass.run_on_function(func, am);

    match &result {
        Ok(preserved) => am.invalidate(preserved),
        Err(failure) => am.invalidate(failure.preserved()),
    }

    let unit = IrUnit::Function(func);

    match result {
        Ok(_) => {
            if let Some(pi) = instrumentor {
                pi.run_after_pass(pass.name(), unit);
            }

            Ok(())
        }
        Err(failure) => {
            tracing::debug!(pass = pass.name(), function = func.name(), %failure, "pass failed");

            if let Some(pi) = instrumentor {
                pi.run_after_pass_failed(pass.name(), unit);
            }

            Err(PipelineFailure::new(pass.name(), unit, failure))
        }
    }
}

pub(crate) fn run_module_pass(
    pass: &mut dyn ModulePass,
    module: &mut Module,
    am: &ModuleAnalysisManager<'_>,
) -> Result<(), PipelineFailure> {
    let instrumentor = am.instrumentor();

    tracing::trace!(pass = pass.name(), module = module.name(), "running module pass");

    if let Some(pi) = instrumentor {
        pi.run_before_pass(pass.name(), IrUnit::Module(module));
    }

    let result = pass.run_on_module(module, am);

    match &result {
        Ok(preserved) => am.invalidate(preserved),
        Err(failure) => am.invalidate(failure.preserved()),
    }

    let unit = IrUnit::Module(module);

    match result {
        Ok(_) => {
            if let Some(pi) = instrumentor {
                pi.run_after_pass(pass.name(), unit);
            }

            Ok(())
        }
        Err(failure) => {
            tracing::debug!(pass = pass.name(), module = module.name(), %failure, "pass failed");

            if let Some(pi) = instrumentor {
                pi.run_after_pass_failed(pass.name(), unit);
            }

            Err(PipelineFailure::new(pass.name(), unit, failure))
        }
    }
}
