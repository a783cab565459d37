//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the pass infrastructure used by the middle-end of the compiler.
//!
//! Passes at their core are just objects that take in IR and report what
//! they changed:
//!
//! ```
//! # use garnet::ir::Function;
//! # use garnet::pass::*;
//! struct Nothing;
//!
//! impl FunctionPass for Nothing {
//!     fn name(&self) -> &str {
//!         "nothing"
//!     }
//!
//!     fn run_on_function(&mut self, _: &mut Function, _: &FunctionAnalysisManager<'_>) -> PassResult {
//!         Ok(PreservedAnalyses::all())
//!     }
//! }
//! ```
//!
//! # Function vs. Module Passes
//! Passes can either operate over an entire module, or they can
//! operate on a single function. Practically, the only difference is how
//! much IR is visible, and which analysis manager is given.
//!
//! Function passes are never run directly, the [`PassManager`] wraps runs of
//! function passes in a [`ModuleToFunctionPassAdaptor`] that runs them over
//! every function with a body.
//!
//! # Analyses
//! Analyses are computed lazily and cached per IR unit. Every pass returns
//! the set of analyses it preserves, and everything else is invalidated as
//! soon as the pass finishes. Passes that can't say anything useful should
//! return [`PreservedAnalyses::none`].
//!
//! # Failure
//! A pass can fail by returning a [`PassFailure`]. The rest of the pipeline
//! is skipped and [`PassManager::run`] reports the innermost pass that failed.

mod analysis;
mod cache;
mod error;
mod executor;
mod instrumentor;
mod manager;
mod preserved;
mod transform;

pub use analysis::*;
pub use cache::*;
pub use error::*;
pub use executor::*;
pub use instrumentor::*;
pub use manager::PassManager;
pub use preserved::*;
pub use transform::{FunctionPass, ModulePass, Pass, PassKind};
