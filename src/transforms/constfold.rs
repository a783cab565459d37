//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Function, Inst};
use crate::pass::{FunctionAnalysisManager, FunctionPass, PassResult, PreservedAnalyses};
use crate::utility::SaHashMap;

/// Replaces binary operations over constants with the constant they evaluate to.
///
/// Arithmetic wraps on overflow. The now-unused operands are left alone,
/// [`DeadCodeEliminationPass`](crate::transforms::DeadCodeEliminationPass) cleans them up.
pub struct ConstantFoldPass;

impl FunctionPass for ConstantFoldPass {
    fn name(&self) -> &str {
        "constfold"
    }

    fn run_on_function(&mut self, func: &mut Function, _: &FunctionAnalysisManager<'_>) -> PassResult {
        if fold_constants(func) == 0 {
            Ok(PreservedAnalyses::all())
        } else {
            Ok(PreservedAnalyses::none())
        }
    }
}

/// Folds every constant binary operation in `func`, returning how many
/// instructions were folded.
pub fn fold_constants(func: &mut Function) -> usize {
    let Some(body) = func.body_mut() else {
        return 0;
    };

    let mut known = SaHashMap::default();
    let mut folded = 0;

    // bodies are straight-line, by the time we see a use we've seen the def
    for inst in body.insts_mut().iter_mut() {
        match *inst {
            Inst::Const { dest, value } => {
                known.insert(dest, value);
            }
            Inst::Binary { dest, op, lhs, rhs } => {
                if let (Some(&lhs), Some(&rhs)) = (known.get(&lhs), known.get(&rhs)) {
                    let value = op.evaluate(lhs, rhs);

                    *inst = Inst::Const { dest, value };
                    known.insert(dest, value);
                    folded += 1;
                }
            }
            _ => {}
        }
    }

    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, Linkage, Module, Value};

    #[test]
    fn folds_chains() {
        let mut m = Module::new("test");
        let mut b = m.define_function("f", 1, Linkage::Public);
        let x = b.iconst(i64::MAX);
        let y = b.iconst(1);
        let z = b.binary(BinaryOp::Add, x, y);
        let w = b.binary(BinaryOp::Mul, z, y);
        let p = b.binary(BinaryOp::Sub, w, b.param(0));
        b.ret(Some(p));
        let f = b.define();

        assert_eq!(fold_constants(m.function_mut(f)), 2);

        let insts = m.function(f).body().unwrap().insts();

        assert_eq!(insts[2], Inst::Const { dest: z, value: i64::MIN });
        assert_eq!(insts[3], Inst::Const { dest: w, value: i64::MIN });
        assert!(matches!(insts[4], Inst::Binary { dest, .. } if dest == p));
        assert_eq!(Value::new(0), m.function(f).params().next().unwrap());
    }

    #[test]
    fn nothing_to_fold() {
        let mut m = Module::new("test");
        let f = m.declare_function("f", 0);

        assert_eq!(fold_constants(m.function_mut(f)), 0);
    }
}
