//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![allow(dead_code)]
#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]
#![allow(unused_variables)]

//! # Garnet
//!
//! A pass pipeline and analysis caching engine for a small compiler middle-end.
//!
//! Pipelines are built with a [`PassManager`](pass::PassManager), which owns
//! every pass and groups function passes into per-function pipelines. Analyses
//! are computed lazily per IR unit and invalidated based on what each pass
//! reports it preserved.

pub mod analysis;
pub mod instrument;
pub mod ir;
pub mod pass;
pub mod reader;
pub mod registry;
pub mod transforms;
pub mod utility;

#[cfg(feature = "dev-tools")]
pub mod cli;

use crate::pass::{PassManager, PipelineFailure};
use crate::registry::{PassRegistry, PipelineError};
use thiserror::Error;

pub use reader::parse_ir;

/// Everything that can go wrong in [`run_passes`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The pipeline text named a pass that doesn't exist.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// A pass failed while the pipeline was running.
    #[error(transparent)]
    Failure(#[from] PipelineFailure),
}

/// A helper function that handles "run these passes specified by the user" in a way that multiple
/// tools can use.
///
/// This is not intended to be used for pre-determined pass pipelines, but is useful for tools
/// that work in a similar way to `gopt`.
///
/// - `verify` is whether to insert verify passes between all passes
/// - `pipelines` are textual pipelines (see [`registry`]), built in order
pub fn run_passes(module: &mut ir::Module, verify: bool, pipelines: &[&str]) -> Result<(), RunError> {
    let registry = PassRegistry::with_builtins();
    let mut pm = PassManager::new(verify);

    for pipeline in pipelines {
        registry.build_pipeline(pipeline, &mut pm)?;
    }

    pm.run(module)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stringify_module;

    const SOURCE: &str = "
declare @print(%x)

private fn @unused() {
  ret
}

private fn @compute(%x) {
  %two = const 2
  %three = const 3
  %six = mul %two, %three
  %dead = add %six, %x
  %r = add %x, %six
  ret %r
}

fn @main() {
  %a = const 7
  %b = call @compute(%a)
  call @print(%b)
  ret
}
";

    #[test]
    fn optimizes_end_to_end() {
        let mut m = parse_ir("test", SOURCE).unwrap();

        run_passes(&mut m, true, &["constfold,dce", "globaldce"]).unwrap();

        let expected = "; module `test`\n\
                        \n\
                        declare @print(%0)\n\
                        \n\
                        private fn @compute(%0) {\n\
                        \x20 %3 = const 6\n\
                        \x20 %5 = add %0, %3\n\
                        \x20 ret %5\n\
                        }\n\
                        \n\
                        fn @main() {\n\
                        \x20 %0 = const 7\n\
                        \x20 %1 = call @compute(%0)\n\
                        \x20 call @print(%1)\n\
                        \x20 ret\n\
                        }\n";

        assert_eq!(stringify_module(&m), expected);
    }

    #[test]
    fn reports_unknown_passes() {
        let mut m = parse_ir("test", SOURCE).unwrap();
        let err = run_passes(&mut m, false, &["inline"]).unwrap_err();

        assert_eq!(err, RunError::Pipeline(PipelineError::UnknownPass("inline".to_owned())));
    }
}
