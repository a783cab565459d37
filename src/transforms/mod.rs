//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the built-in passes.
//!
//! These are the passes that can (potentially) modify IR, and don't
//! actually logically yield a result.
//!
//! Some of these are not actually transformations (e.g. the verifiers and
//! the module printer manipulate no IR), but most of them are. All of them
//! logically yield no result except the IR that exists after they run.

mod constfold;
mod dce;
mod globaldce;
mod printers;
mod verify;

pub use constfold::*;
pub use dce::*;
pub use globaldce::*;
pub use printers::*;
pub use verify::*;
