//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains the analyses defined in the Garnet project.
//!
//! These all model either the [`FunctionAnalysis`] or the [`ModuleAnalysis`]
//! trait, and are meant to be requested through an analysis manager so that
//! their results are cached.
//!
//! [`FunctionAnalysis`]: crate::pass::FunctionAnalysis
//! [`ModuleAnalysis`]: crate::pass::ModuleAnalysis

mod callgraph;
mod uses;

pub use callgraph::*;
pub use uses::*;
