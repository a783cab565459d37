//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A reader for the textual form of the IR, the same form that
//! [`Module`]'s `Display` implementation produces.
//!
//! ```
//! # use garnet::reader::parse_ir;
//! let module = parse_ir("example", "
//!     declare @puts(%s)
//!
//!     fn @main(%x) {
//!       %y = call @puts(%x)
//!       ret %y
//!     }
//! ").unwrap();
//!
//! assert_eq!(module.function_count(), 2);
//! ```

mod lex;
mod parse;

pub use lex::*;
pub use parse::*;

use crate::ir::Module;
use thiserror::Error;

/// A problem found while reading textual IR.
///
/// This only covers syntax and name resolution, IR that reads fine can still
/// fail verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    /// The 1-indexed line of the offending text
    pub line: u32,
    /// The 1-indexed column of the offending text
    pub col: u16,
    /// The length of the offending text in bytes
    pub len: u16,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    /// Creates an error at a specific position.
    pub fn new(line: u32, col: u16, len: u16, message: String) -> Self {
        Self {
            line,
            col,
            len,
            message,
        }
    }

    /// Creates an error that points at a token.
    pub fn at(pair: TokPair<'_>, message: String) -> Self {
        Self::new(pair.line, pair.col, pair.len, message)
    }
}

/// Parses textual IR into a module named `name`.
pub fn parse_ir(name: &str, source: &str) -> Result<Module, ParseError> {
    Parser::new(name, source).parse()
}

/// Renders a [`ParseError`] as a diagnostic with the offending line and a
/// caret underline, e.g.
///
/// ```text
///   --> test.gir:2:3
///    |
///  2 |   %x = bogus
///    |        ^^^^^
///    |
///    = expected `const`, `add`, `sub`, `mul` or `call`, got `bogus`
/// ```
pub fn format_parse_error(name: &str, source: &str, err: &ParseError) -> String {
    // errors at EOF can point one past the last line
    let line = source.lines().nth((err.line as usize).saturating_sub(1)).unwrap_or("");

    let (line_n, col_n) = (err.line.to_string(), err.col.to_string());
    let mut error = String::default();

    let num_padding = " ".repeat(line_n.len());
    let col_padding = " ".repeat((err.col as usize).saturating_sub(1));
    let underline = "^".repeat((err.len as usize).max(1));

    error += &format!("  --> {name}:{line_n}:{col_n}\n");
    error += &format!(" {num_padding} |\n");
    error += &format!(" {line_n} | {line}\n");
    error += &format!(" {num_padding} | {col_padding}{underline}\n");
    error += &format!(" {num_padding} |\n");
    error += &format!(" {num_padding} = {}", err.message);

    error
}
