//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::*;
use crate::pass::*;
use crate::utility::SaHashSet;

/// An IR validity verification pass over a single function.
///
/// This does nothing if the function is valid. If it isn't, the pass fails
/// with every problem that was found. It never changes the IR, so it preserves
/// every analysis whether it fails or not.
pub struct FunctionVerifierPass;

impl FunctionPass for FunctionVerifierPass {
    fn name(&self) -> &str {
        "verify-function"
    }

    fn run_on_function(&mut self, func: &mut Function, _: &FunctionAnalysisManager<'_>) -> PassResult {
        verify_function(func).map_err(into_failure)?;

        Ok(PreservedAnalyses::all())
    }
}

/// An IR validity verification pass over an entire module.
///
/// This checks every function like [`FunctionVerifierPass`] does, and also
/// checks that every call refers to a function in the module.
pub struct ModuleVerifierPass;

impl ModulePass for ModuleVerifierPass {
    fn name(&self) -> &str {
        "verify-module"
    }

    fn run_on_module(&mut self, module: &mut Module, _: &ModuleAnalysisManager<'_>) -> PassResult {
        verify_module(module).map_err(into_failure)?;

        Ok(PreservedAnalyses::all())
    }
}

fn into_failure(errors: Vec<String>) -> PassFailure {
    PassFailure::new(errors.join("; ")).preserving(PreservedAnalyses::all())
}

/// Verifies that a single function is valid.
///
/// This checks that the body ends in exactly one `ret`, that every value is
/// defined exactly once (parameters included), and that every value is defined
/// before it is used. Declarations are always valid.
///
/// If it isn't valid, this function returns a list of errors.
pub fn verify_function(func: &Function) -> Result<(), Vec<String>> {
    let mut verifier = Verifier {
        errors: Vec::default(),
        defined: SaHashSet::default(),
    };

    verifier.walk_function(func);
    verifier.finish()
}

/// Verifies that an entire module is valid.
///
/// Every function is checked with [`verify_function`], and every call is
/// checked against the function it calls: the callee has to exist in the module
/// and has to be passed the number of arguments it declares.
pub fn verify_module(module: &Module) -> Result<(), Vec<String>> {
    let mut verifier = Verifier {
        errors: Vec::default(),
        defined: SaHashSet::default(),
    };

    for func in module.iter() {
        verifier.walk_function(func);
        verifier.walk_calls(module, func);
    }

    verifier.finish()
}

macro_rules! verify_assert {
    ($self:expr, $func:expr, $cond:expr, $($explanation:tt)+) => {
        if !($cond) {
            $self.errors.push(format!("@{}: {}", $func.name(), format!($($explanation)+)));
        }
    };
}

struct Verifier {
    errors: Vec<String>,
    defined: SaHashSet<Value>,
}

impl Verifier {
    fn finish(self) -> Result<(), Vec<String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn walk_function(&mut self, func: &Function) {
        let Some(body) = func.body() else {
            return;
        };

        self.defined.clear();
        self.defined.extend(func.params());

        let insts = body.insts();

        verify_assert!(self, func, !insts.is_empty(), "function body is empty");

        for (i, inst) in insts.iter().enumerate() {
            let last = i + 1 == insts.len();

            verify_assert!(
                self,
                func,
                inst.is_terminator() == last,
                "{}",
                if last {
                    "body does not end in `ret`"
                } else {
                    "`ret` in the middle of the body"
                }
            );

            for operand in inst.operands() {
                verify_assert!(
                    self,
                    func,
                    self.defined.contains(&operand),
                    "use of undefined value {operand} in `{inst}`"
                );
            }

            if let Some(result) = inst.result() {
                let is_param = result.index() < func.param_count();

                verify_assert!(self, func, !is_param, "`{inst}` redefines parameter {result}");

                let fresh = self.defined.insert(result);

                verify_assert!(self, func, fresh || is_param, "{result} is defined more than once");
            }
        }
    }

    fn walk_calls(&mut self, module: &Module, func: &Function) {
        for inst in func.body().iter().flat_map(|body| body.insts()) {
            let Inst::Call { callee, args, .. } = inst else {
                continue;
            };

            let target = module.find_function_by_name(callee);

            verify_assert!(self, func, target.is_some(), "call to undefined function @{callee}");

            if let Some(target) = target {
                let expected = module.function(target).param_count() as usize;

                verify_assert!(
                    self,
                    func,
                    args.len() == expected,
                    "call to @{callee} passes {} arguments, expected {expected}",
                    args.len()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(insts: Vec<Inst>, params: u32) -> Module {
        let mut m = Module::new("test");
        m.declare_function("g", 1);

        let mut b = m.define_function("f", params, Linkage::Public);

        for inst in insts {
            b.append(inst);
        }

        b.define();

        m
    }

    fn func_errors(m: &Module) -> Vec<String> {
        let f = m.find_function_by_name("f").unwrap();

        verify_function(m.function(f)).unwrap_err()
    }

    #[test]
    fn valid_function() {
        let m = build(
            vec![
                Inst::Const { dest: Value::new(1), value: 2 },
                Inst::Binary {
                    dest: Value::new(2),
                    op: BinaryOp::Add,
                    lhs: Value::new(0),
                    rhs: Value::new(1),
                },
                Inst::Ret { value: Some(Value::new(2)) },
            ],
            1,
        );

        assert!(verify_module(&m).is_ok());
        assert!(m.verify());
    }

    #[test]
    fn missing_ret() {
        let m = build(vec![Inst::Const { dest: Value::new(0), value: 2 }], 0);

        assert_eq!(func_errors(&m), vec!["@f: body does not end in `ret`"]);
    }

    #[test]
    fn early_ret() {
        let m = build(vec![Inst::Ret { value: None }, Inst::Ret { value: None }], 0);

        assert_eq!(func_errors(&m), vec!["@f: `ret` in the middle of the body"]);
    }

    #[test]
    fn empty_body() {
        let m = build(vec![], 0);

        assert_eq!(func_errors(&m), vec!["@f: function body is empty"]);
    }

    #[test]
    fn use_before_def() {
        let m = build(
            vec![
                Inst::Ret { value: Some(Value::new(1)) },
                Inst::Const { dest: Value::new(1), value: 2 },
            ],
            0,
        );

        let errors = func_errors(&m);

        assert!(errors.contains(&"@f: use of undefined value %1 in `ret %1`".to_owned()));
    }

    #[test]
    fn double_definition() {
        let m = build(
            vec![
                Inst::Const { dest: Value::new(1), value: 2 },
                Inst::Const { dest: Value::new(1), value: 3 },
                Inst::Ret { value: None },
            ],
            1,
        );

        assert_eq!(func_errors(&m), vec!["@f: %1 is defined more than once"]);
    }

    #[test]
    fn parameter_redefinition() {
        let m = build(
            vec![
                Inst::Const { dest: Value::new(0), value: 2 },
                Inst::Ret { value: None },
            ],
            1,
        );

        assert_eq!(func_errors(&m), vec!["@f: `%0 = const 2` redefines parameter %0"]);
    }

    #[test]
    fn bad_calls() {
        let m = build(
            vec![
                Inst::Call {
                    dest: None,
                    callee: "g".to_owned(),
                    args: Default::default(),
                },
                Inst::Call {
                    dest: None,
                    callee: "h".to_owned(),
                    args: Default::default(),
                },
                Inst::Ret { value: None },
            ],
            0,
        );

        assert!(m.iter().all(|f| verify_function(f).is_ok()));
        assert_eq!(
            verify_module(&m).unwrap_err(),
            vec![
                "@f: call to @g passes 0 arguments, expected 1",
                "@f: call to undefined function @h",
            ]
        );
        assert!(!m.verify());
    }

    #[test]
    fn declarations_are_valid() {
        let mut m = Module::new("test");
        let f = m.declare_function("f", 3);

        assert!(m.function(f).verify());
    }

    #[test]
    fn verifier_passes_preserve_everything_on_failure() {
        let mut m = build(vec![], 0);
        let mam = ModuleAnalysisManager::new(&m, None);
        let failure = ModuleVerifierPass.run_on_module(&mut m, &mam).unwrap_err();

        assert!(failure.preserved().is_all());
        assert_eq!(failure.message(), "@f: function body is empty");
    }
}
