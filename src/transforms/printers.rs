//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Module;
use crate::pass::{ModuleAnalysisManager, ModulePass, PassFailure, PassResult, PreservedAnalyses};
use std::io;

/// Writes the textual form of the module out whenever it runs.
pub struct ModuleWriterPass {
    out: Box<dyn io::Write>,
}

impl ModuleWriterPass {
    /// Shorthand for a writer that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a writer that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates an instance of the pass with a given writer.
    ///
    /// This writer will be where the module is printed out when the pass
    /// is run over the IR.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
        }
    }
}

impl ModulePass for ModuleWriterPass {
    fn name(&self) -> &str {
        "print"
    }

    fn run_on_module(&mut self, module: &mut Module, _: &ModuleAnalysisManager<'_>) -> PassResult {
        write!(self.out, "{module}")
            .and_then(|_| self.out.flush())
            .map_err(|e| {
                PassFailure::new(format!("unable to write module: {e}"))
                    .preserving(PreservedAnalyses::all())
            })?;

        Ok(PreservedAnalyses::all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_become_failures() {
        let mut m = Module::new("test");
        let mam = ModuleAnalysisManager::new(&m, None);
        let failure = ModuleWriterPass::with_writer(Closed)
            .run_on_module(&mut m, &mam)
            .unwrap_err();

        assert_eq!(failure.message(), "unable to write module: closed");
        assert!(failure.preserved().is_all());
    }
}
