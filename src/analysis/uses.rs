//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Function, Value};
use crate::pass::{FunctionAnalysis, FunctionAnalysisManager};
use crate::utility::SaHashMap;

/// The number of times every value in a function is used as an operand.
///
/// Values that are never used are not stored, [`Self::uses`] reports `0` for them.
#[derive(Debug, Default)]
pub struct UseCounts {
    counts: SaHashMap<Value, usize>,
}

impl UseCounts {
    /// Directly computes use counts for a given function.
    ///
    /// This should not be used directly in normal compiler passes, it should be
    /// requested from the [`FunctionAnalysisManager`].
    pub fn compute_for(func: &Function) -> Self {
        let mut counts = SaHashMap::default();

        for inst in func.body().iter().flat_map(|body| body.insts()) {
            for operand in inst.operands() {
                *counts.entry(operand).or_insert(0) += 1;
            }
        }

        Self { counts }
    }

    /// Gets the number of times `value` is used.
    pub fn uses(&self, value: Value) -> usize {
        self.counts.get(&value).copied().unwrap_or(0)
    }

    /// Checks if `value` is never used.
    pub fn is_unused(&self, value: Value) -> bool {
        self.uses(value) == 0
    }
}

impl FunctionAnalysis for UseCounts {
    fn compute(func: &Function, _: &FunctionAnalysisManager<'_>) -> Self {
        Self::compute_for(func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, Linkage, Module};

    #[test]
    fn counts_every_operand() {
        let mut m = Module::new("test");
        let mut b = m.define_function("f", 1, Linkage::Public);
        let x = b.param(0);
        let y = b.binary(BinaryOp::Mul, x, x);
        let unused = b.iconst(3);
        b.ret(Some(y));
        let f = b.define();

        let uses = UseCounts::compute_for(m.function(f));

        assert_eq!(uses.uses(x), 2);
        assert_eq!(uses.uses(y), 1);
        assert!(uses.is_unused(unused));
    }

    #[test]
    fn declarations_have_no_uses() {
        let mut m = Module::new("test");
        let f = m.declare_function("f", 2);

        assert!(UseCounts::compute_for(m.function(f)).is_unused(Value::new(0)));
    }
}
