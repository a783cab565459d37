//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::CallGraph;
use crate::ir::{Func, Module};
use crate::pass::{ModuleAnalysisManager, ModulePass, PassResult, PreservedAnalyses};
use smallvec::SmallVec;

/// Removes private functions that can't be reached from any public function.
pub struct GlobalDeadCodeEliminationPass;

impl ModulePass for GlobalDeadCodeEliminationPass {
    fn name(&self) -> &str {
        "globaldce"
    }

    fn run_on_module(&mut self, module: &mut Module, am: &ModuleAnalysisManager<'_>) -> PassResult {
        let graph = am.get::<CallGraph>(module);
        let dead: SmallVec<[Func; 8]> = module
            .functions()
            .filter(|&func| !graph.is_reachable(func))
            .collect();

        if dead.is_empty() {
            return Ok(PreservedAnalyses::all());
        }

        for func in dead {
            if let Some(removed) = module.remove_function(func) {
                tracing::debug!(function = removed.name(), "removed unreachable function");
            }
        }

        Ok(PreservedAnalyses::none())
    }
}
