//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Function, Linkage, Module};
use std::fmt;

// the output of these is what `reader::parse_ir` reads back in

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match (self.body(), self.linkage()) {
            (None, _) => "declare",
            (Some(_), Linkage::Public) => "fn",
            (Some(_), Linkage::Private) => "private fn",
        };

        write!(f, "{keyword} @{}(", self.name())?;

        for (i, param) in self.params().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }

            write!(f, "{param}")?;
        }

        write!(f, ")")?;

        let Some(body) = self.body() else {
            return writeln!(f);
        };

        writeln!(f, " {{")?;

        for inst in body.insts() {
            writeln!(f, "  {inst}")?;
        }

        writeln!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module `{}`", self.name())?;

        for func in self.iter() {
            writeln!(f)?;
            write!(f, "{func}")?;
        }

        Ok(())
    }
}

/// Stringifies a module into its textual form.
pub fn stringify_module(module: &Module) -> String {
    module.to_string()
}

/// Prints a module to stdout.
pub fn print_module(module: &Module) {
    print!("{module}");
}
