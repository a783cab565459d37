//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::UseCounts;
use crate::ir::{Function, Value};
use crate::pass::{FunctionAnalysisManager, FunctionPass, PassResult, PreservedAnalyses};
use crate::utility::SaHashMap;

/// Removes pure instructions whose results are never used.
///
/// Removing an instruction can make its operands dead, those are removed
/// in the same run.
pub struct DeadCodeEliminationPass;

impl FunctionPass for DeadCodeEliminationPass {
    fn name(&self) -> &str {
        "dce"
    }

    fn run_on_function(&mut self, func: &mut Function, am: &FunctionAnalysisManager<'_>) -> PassResult {
        let uses = am.get::<UseCounts>(func);

        if eliminate_dead_code(func, &uses) == 0 {
            Ok(PreservedAnalyses::all())
        } else {
            Ok(PreservedAnalyses::none())
        }
    }
}

/// Removes every dead pure instruction from `func`, returning how many
/// were removed. `uses` has to be up to date for `func`.
pub fn eliminate_dead_code(func: &mut Function, uses: &UseCounts) -> usize {
    let Some(body) = func.body_mut() else {
        return 0;
    };

    // uses that went away because the user was removed
    let mut dead_uses = SaHashMap::<Value, usize>::default();
    let insts = body.insts_mut();
    let before = insts.len();
    let mut keep = vec![true; before];

    // iterate backwards, we need to see uses before defs
    for (i, inst) in insts.iter().enumerate().rev() {
        let dead = match inst.result() {
            Some(result) if inst.is_pure() => {
                uses.uses(result) == dead_uses.get(&result).copied().unwrap_or(0)
            }
            _ => false,
        };

        if !dead {
            continue;
        }

        keep[i] = false;

        for operand in inst.operands() {
            *dead_uses.entry(operand).or_insert(0) += 1;
        }
    }

    let mut flags = keep.into_iter();

    insts.retain(|_| flags.next().unwrap_or(true));

    before - insts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, Inst, Linkage, Module};
    use crate::pass::ModuleAnalysisManager;

    #[test]
    fn removes_dead_chains_and_keeps_calls() {
        let mut m = Module::new("test");
        m.declare_function("g", 1);

        let mut b = m.define_function("f", 1, Linkage::Public);
        let x = b.iconst(1);
        let y = b.binary(BinaryOp::Add, x, x);
        let _ = b.binary(BinaryOp::Mul, y, y);
        let z = b.iconst(2);
        b.call("g", &[z]);
        b.ret(Some(b.param(0)));
        let f = b.define();

        let mam = ModuleAnalysisManager::new(&m, None);
        let mut pass = DeadCodeEliminationPass;
        let func = m.function_mut(f);
        let fam = mam.slice(func);
        let preserved = pass.run_on_function(func, &fam).unwrap();

        assert!(preserved.is_none());
        assert_eq!(
            m.function(f).body().unwrap().insts(),
            &[
                Inst::Const { dest: z, value: 2 },
                Inst::Call {
                    dest: Some(Value::new(5)),
                    callee: "g".to_owned(),
                    args: [z].into_iter().collect(),
                },
                Inst::Ret { value: Some(Value::new(0)) },
            ]
        );
    }

    #[test]
    fn live_code_is_untouched() {
        let mut m = Module::new("test");
        let mut b = m.define_function("f", 0, Linkage::Public);
        let x = b.iconst(1);
        b.ret(Some(x));
        let f = b.define();

        let uses = UseCounts::compute_for(m.function(f));

        assert_eq!(eliminate_dead_code(m.function_mut(f), &uses), 0);
    }
}
