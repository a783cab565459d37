//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::pass::{IrUnit, PassInstrumentation};
use std::io;

/// Prints the IR unit a pass ran over after the pass finishes.
///
/// Each dump is preceded by a header line of the form
/// `// ----- IR dump after <pass> on <unit> ----- //`.
pub struct IrPrinter {
    out: Box<dyn io::Write>,
    only_failures: bool,
}

impl IrPrinter {
    /// Shorthand for a printer that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a printer that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates a printer that dumps the IR after every pass into `writer`.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
            only_failures: false,
        }
    }

    /// Makes the printer skip passes that succeeded.
    pub fn only_failures(mut self) -> Self {
        self.only_failures = true;
        self
    }

    fn dump(&mut self, pass: &str, unit: IrUnit<'_>) {
        let result = match unit {
            IrUnit::Module(module) => {
                writeln!(self.out, "// ----- IR dump after {pass} on {unit} ----- //\n{module}")
            }
            IrUnit::Function(func) => {
                writeln!(self.out, "// ----- IR dump after {pass} on {unit} ----- //\n{func}")
            }
        };

        if let Err(e) = result {
            tracing::warn!(pass, error = %e, "unable to print IR");
        }
    }
}

impl PassInstrumentation for IrPrinter {
    fn after_pass(&mut self, pass: &str, unit: IrUnit<'_>) {
        if !self.only_failures {
            self.dump(pass, unit);
        }
    }

    fn after_pass_failed(&mut self, pass: &str, unit: IrUnit<'_>) {
        self.dump(pass, unit);
    }
}
