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
use std::cell::RefCell;
use std::fmt;

/// The IR unit that a pass is being run over, as seen by instrumentation.
#[derive(Copy, Clone, Debug)]
pub enum IrUnit<'a> {
    /// A module pass is running over an entire module.
    Module(&'a Module),
    /// A function pass is running over a single function.
    Function(&'a Function),
}

impl<'a> IrUnit<'a> {
    /// Gets the name of the unit, without any sigils.
    pub fn name(&self) -> &'a str {
        match self {
            IrUnit::Module(module) => module.name(),
            IrUnit::Function(func) => func.name(),
        }
    }
}

impl fmt::Display for IrUnit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrUnit::Module(module) => write!(f, "module `{}`", module.name()),
            IrUnit::Function(func) => write!(f, "function @{}", func.name()),
        }
    }
}

/// An observer that is notified around every pass that runs.
///
/// Every `before_pass` is followed by exactly one `after_pass` or
/// `after_pass_failed` for the same pass and unit. Calls nest: the
/// hooks for passes inside of a function pipeline are fired between the
/// `before_pass` and `after_pass` of the module pass that runs that pipeline.
///
/// Instrumentation observes, it can't change control flow.
pub trait PassInstrumentation {
    /// Called right before `pass` runs over `unit`.
    fn before_pass(&mut self, pass: &str, unit: IrUnit<'_>) {
        let _ = (pass, unit);
    }

    /// Called after `pass` ran successfully over `unit`.
    fn after_pass(&mut self, pass: &str, unit: IrUnit<'_>) {
        let _ = (pass, unit);
    }

    /// Called after `pass` failed on `unit`.
    fn after_pass_failed(&mut self, pass: &str, unit: IrUnit<'_>) {
        let _ = (pass, unit);
    }
}

/// Owns a list of [`PassInstrumentation`]s and forwards every event to them,
/// in the order they were registered.
#[derive(Default)]
pub struct PassInstrumentor {
    instrumentations: RefCell<Vec<Box<dyn PassInstrumentation>>>,
}

impl PassInstrumentor {
    /// Creates an instrumentor with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instrumentation. It is notified after every instrumentation
    /// that was registered before it.
    pub fn add_instrumentation<I: PassInstrumentation + 'static>(&mut self, instrumentation: I) {
        self.instrumentations
            .get_mut()
            .push(Box::new(instrumentation));
    }

    /// Notifies every instrumentation that `pass` is about to run.
    pub fn run_before_pass(&self, pass: &str, unit: IrUnit<'_>) {
        for pi in self.instrumentations.borrow_mut().iter_mut() {
            pi.before_pass(pass, unit);
        }
    }

    /// Notifies every instrumentation that `pass` completed.
    pub fn run_after_pass(&self, pass: &str, unit: IrUnit<'_>) {
        for pi in self.instrumentations.borrow_mut().iter_mut() {
            pi.after_pass(pass, unit);
        }
    }

    /// Notifies every instrumentation that `pass` failed.
    pub fn run_after_pass_failed(&self, pass: &str, unit: IrUnit<'_>) {
        for pi in self.instrumentations.borrow_mut().iter_mut() {
            pi.after_pass_failed(pass, unit);
        }
    }

    /// Gets the number of registered instrumentations.
    pub fn len(&self) -> usize {
        self.instrumentations.borrow().len()
    }

    /// Checks if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.instrumentations.borrow().is_empty()
    }
}

impl fmt::Debug for PassInstrumentor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassInstrumentor")
            .field("instrumentations", &self.len())
            .finish()
    }
}
