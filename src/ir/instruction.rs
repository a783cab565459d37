//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A reference to a value defined inside of a single function.
///
/// Parameters take the first `n` values of a function, every value after that
/// is defined by exactly one instruction. A `Value` is only meaningful inside
/// of the function that it came from.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Value(u32);

impl Value {
    /// Creates a value reference from a raw index.
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Gets the raw index of the value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// The operation performed by a [`Inst::Binary`] instruction.
///
/// All arithmetic is two's complement and wraps on overflow.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    /// `add`
    Add,
    /// `sub`
    Sub,
    /// `mul`
    Mul,
}

impl BinaryOp {
    /// Evaluates the operation over two known operands.
    pub fn evaluate(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
        }
    }

    /// Gets the mnemonic used for the operation in textual IR.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
        }
    }
}

/// A single instruction inside of a function body.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Inst {
    /// `%dest = const 42`
    Const {
        /// The value being defined
        dest: Value,
        /// The constant being materialized
        value: i64,
    },
    /// `%dest = add %lhs, %rhs`
    Binary {
        /// The value being defined
        dest: Value,
        /// The operation being performed
        op: BinaryOp,
        /// The left operand
        lhs: Value,
        /// The right operand
        rhs: Value,
    },
    /// `%dest = call @callee(%args...)` or `call @callee(%args...)`
    Call {
        /// The value being defined, if the result is used at all
        dest: Option<Value>,
        /// The name of the function being called, without `@`
        callee: String,
        /// The arguments passed to the callee
        args: SmallVec<[Value; 4]>,
    },
    /// `ret %value` or `ret`
    Ret {
        /// The value being returned, if there is one
        value: Option<Value>,
    },
}

impl Inst {
    /// Gets the value defined by the instruction, if it defines one.
    pub fn result(&self) -> Option<Value> {
        match self {
            Inst::Const { dest, .. } | Inst::Binary { dest, .. } => Some(*dest),
            Inst::Call { dest, .. } => *dest,
            Inst::Ret { .. } => None,
        }
    }

    /// Gets every value used as an operand of the instruction.
    pub fn operands(&self) -> SmallVec<[Value; 4]> {
        match self {
            Inst::Const { .. } => SmallVec::new(),
            Inst::Binary { lhs, rhs, .. } => smallvec::smallvec![*lhs, *rhs],
            Inst::Call { args, .. } => args.clone(),
            Inst::Ret { value } => value.iter().copied().collect(),
        }
    }

    /// Checks whether the instruction can be removed when its result is unused.
    ///
    /// Calls are always assumed to have side effects, and `ret` is a terminator.
    pub fn is_pure(&self) -> bool {
        matches!(self, Inst::Const { .. } | Inst::Binary { .. })
    }

    /// Checks if the instruction ends a function body.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Ret { .. })
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Const { dest, value } => write!(f, "{dest} = const {value}"),
            Inst::Binary { dest, op, lhs, rhs } => {
                write!(f, "{dest} = {} {lhs}, {rhs}", op.mnemonic())
            }
            Inst::Call { dest, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }

                write!(f, "call @{callee}(")?;

                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }

                    write!(f, "{arg}")?;
                }

                write!(f, ")")
            }
            Inst::Ret { value: Some(value) } => write!(f, "ret {value}"),
            Inst::Ret { value: None } => write!(f, "ret"),
        }
    }
}
