//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Func, Inst, Linkage, Module};
use crate::pass::{ModuleAnalysis, ModuleAnalysisManager};
use crate::utility::{SaHashMap, SaHashSet};
use smallvec::SmallVec;

/// Direct call edges between the functions of a module, and which functions
/// can ever be reached from outside of the module.
///
/// Calls to names that aren't in the module are ignored, the verifier is
/// responsible for rejecting those.
#[derive(Debug, Default)]
pub struct CallGraph {
    callees: SaHashMap<Func, SmallVec<[Func; 4]>>,
    reachable: SaHashSet<Func>,
}

impl CallGraph {
    /// Directly computes the call graph for a given module.
    ///
    /// This should not be used directly in normal compiler passes, it should be
    /// requested from the [`ModuleAnalysisManager`].
    pub fn compute_for(module: &Module) -> Self {
        let mut callees = SaHashMap::default();

        for func in module.iter() {
            let mut targets = SmallVec::<[Func; 4]>::new();

            for inst in func.body().iter().flat_map(|body| body.insts()) {
                let Inst::Call { callee, .. } = inst else {
                    continue;
                };

                if let Some(target) = module.find_function_by_name(callee) {
                    targets.push(target);
                }
            }

            targets.sort();
            targets.dedup();
            callees.insert(func.func(), targets);
        }

        let mut graph = Self {
            callees,
            reachable: SaHashSet::default(),
        };

        let roots = module
            .iter()
            .filter(|func| func.linkage() == Linkage::Public)
            .map(|func| func.func());

        let mut worklist: Vec<Func> = roots.collect();

        while let Some(func) = worklist.pop() {
            if !graph.reachable.insert(func) {
                continue;
            }

            worklist.extend(graph.callees(func).iter().copied());
        }

        graph
    }

    /// Gets every function that `func` calls directly, each one only once.
    pub fn callees(&self, func: Func) -> &[Func] {
        self.callees.get(&func).map_or(&[], |callees| callees.as_slice())
    }

    /// Checks if `func` is public or can be reached through calls from a
    /// public function.
    pub fn is_reachable(&self, func: Func) -> bool {
        self.reachable.contains(&func)
    }

    /// Returns an iterator over every reachable function, in no particular order.
    pub fn reachable(&self) -> impl Iterator<Item = Func> + '_ {
        self.reachable.iter().copied()
    }
}

impl ModuleAnalysis for CallGraph {
    fn compute(module: &Module, _: &ModuleAnalysisManager<'_>) -> Self {
        Self::compute_for(module)
    }
}
