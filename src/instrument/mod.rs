//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Built-in [`PassInstrumentation`]s.
//!
//! These observe a pipeline as it runs, they never change what it does.
//!
//! [`PassInstrumentation`]: crate::pass::PassInstrumentation

mod printer;
mod timing;

pub use printer::*;
pub use timing::*;
