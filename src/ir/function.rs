//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{BinaryOp, Inst, Module, ModuleIdentity, Value};
use crate::transforms;
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The reference type for a [`Function`]. These can be looked up
/// at the [`Module`] level, and stay stable for the lifetime of the
/// module even if other functions are removed.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Func(u32);

impl Func {
    pub(in crate::ir) fn new(index: u32) -> Self {
        Self(index)
    }
}

/// Whether a function is visible outside of its module.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Linkage {
    /// Visible to other modules, can never be assumed dead.
    Public,
    /// Only visible inside of the module, `private fn`.
    Private,
}

/// The definition of a function.
///
/// Bodies are a single straight-line sequence of instructions that must
/// end in exactly one `ret`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct FunctionBody {
    insts: Vec<Inst>,
    next_value: u32,
}

impl FunctionBody {
    fn with_params(params: u32) -> Self {
        Self {
            insts: Vec::default(),
            next_value: params,
        }
    }

    /// Gets the instructions that make up the body, in order.
    #[inline]
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// Gets mutable access to the instruction list.
    ///
    /// Transforms are responsible for leaving the body in a state that
    /// still passes verification.
    #[inline]
    pub fn insts_mut(&mut self) -> &mut Vec<Inst> {
        &mut self.insts
    }

    /// Allocates a new value that has not been used anywhere in the body.
    pub fn fresh_value(&mut self) -> Value {
        let value = Value::new(self.next_value);

        self.next_value += 1;

        value
    }

    /// Gets one past the highest value that has been allocated.
    #[inline]
    pub fn next_value(&self) -> u32 {
        self.next_value
    }

    pub(crate) fn reserve_value(&mut self, value: Value) {
        self.next_value = self.next_value.max(value.index() + 1);
    }

    pub(crate) fn push(&mut self, inst: Inst) {
        self.insts.push(inst);
    }
}

/// Models a single function in the IR.
///
/// Every function knows which [`Module`] it belongs to, this is what lets
/// analysis managers check that a function is being analyzed in the right context.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize))]
pub struct Function {
    name: String,
    func: Func,
    module: ModuleIdentity,
    linkage: Linkage,
    params: u32,
    body: Option<FunctionBody>,
}

impl Function {
    pub(in crate::ir) fn new(
        name: String,
        func: Func,
        module: ModuleIdentity,
        linkage: Linkage,
        params: u32,
    ) -> Self {
        Self {
            name,
            func,
            module,
            linkage,
            params,
            body: None,
        }
    }

    /// Gets the name of the function without `@`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a [`Func`] that refers to `self`.
    #[inline]
    pub fn func(&self) -> Func {
        self.func
    }

    /// Gets the identity of the module that owns this function.
    #[inline]
    pub fn module(&self) -> ModuleIdentity {
        self.module
    }

    /// Gets the linkage of the function.
    #[inline]
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Gets the number of parameters the function takes.
    #[inline]
    pub fn param_count(&self) -> u32 {
        self.params
    }

    /// Gets the values that refer to the function's parameters.
    pub fn params(&self) -> impl Iterator<Item = Value> {
        (0..self.params).map(Value::new)
    }

    /// Checks if the function is a declaration, i.e. whether or not
    /// it actually has a body.
    #[inline]
    pub fn is_declaration(&self) -> bool {
        self.body.is_none()
    }

    /// Gets the function body if it exists.
    #[inline]
    pub fn body(&self) -> Option<&FunctionBody> {
        self.body.as_ref()
    }

    /// Gets the function body if it exists.
    #[inline]
    pub fn body_mut(&mut self) -> Option<&mut FunctionBody> {
        self.body.as_mut()
    }

    /// Checks the function for internal consistency. Declarations are always valid.
    ///
    /// See [`verify_function`](crate::transforms::verify_function) for the
    /// list of problems if this returns `false`.
    pub fn verify(&self) -> bool {
        transforms::verify_function(self).is_ok()
    }

    pub(in crate::ir) fn replace_body(&mut self, body: FunctionBody) {
        self.body.replace(body);
    }
}

/// Builds up the body of a function and installs it into the module.
///
/// Nothing is changed in the module until [`Self::define`] is called.
pub struct FuncBuilder<'m> {
    module: &'m mut Module,
    func: Func,
    body: FunctionBody,
}

impl<'m> FuncBuilder<'m> {
    pub(in crate::ir) fn new(module: &'m mut Module, func: Func) -> Self {
        let params = module.function(func).param_count();

        Self {
            module,
            func,
            body: FunctionBody::with_params(params),
        }
    }

    /// Gets the value for parameter `index`.
    pub fn param(&self, index: u32) -> Value {
        debug_assert!(index < self.module.function(self.func).param_count());

        Value::new(index)
    }

    /// Appends `%x = const value`.
    pub fn iconst(&mut self, value: i64) -> Value {
        let dest = self.body.fresh_value();

        self.body.push(Inst::Const { dest, value });

        dest
    }

    /// Appends `%x = op lhs, rhs`.
    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        let dest = self.body.fresh_value();

        self.body.push(Inst::Binary { dest, op, lhs, rhs });

        dest
    }

    /// Appends `%x = call @callee(args...)`.
    pub fn call(&mut self, callee: &str, args: &[Value]) -> Value {
        let dest = self.body.fresh_value();

        self.body.push(Inst::Call {
            dest: Some(dest),
            callee: callee.to_owned(),
            args: SmallVec::from_slice(args),
        });

        dest
    }

    /// Appends `call @callee(args...)` without a result.
    pub fn call_void(&mut self, callee: &str, args: &[Value]) {
        self.body.push(Inst::Call {
            dest: None,
            callee: callee.to_owned(),
            args: SmallVec::from_slice(args),
        });
    }

    /// Appends `ret value`.
    pub fn ret(&mut self, value: Option<Value>) {
        self.body.push(Inst::Ret { value });
    }

    /// Appends an arbitrary instruction. The builder does not check it,
    /// this is mostly useful for building invalid IR in tests.
    pub fn append(&mut self, inst: Inst) {
        if let Some(dest) = inst.result() {
            self.body.reserve_value(dest);
        }

        self.body.push(inst);
    }

    /// Installs the body into the function, replacing any previous body.
    pub fn define(self) -> Func {
        self.module.function_mut(self.func).replace_body(self.body);

        self.func
    }
}
