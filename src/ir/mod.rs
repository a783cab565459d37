//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Provides the IR that the pass infrastructure runs over.
//!
//! The IR is intentionally small: a [`Module`] owns an ordered list of
//! [`Function`]s, and every defined function has a single straight-line
//! body of [`Inst`]s. The pass infrastructure only depends on a few
//! properties of it (identity, ownership, "is this a declaration", and
//! verification), everything else is here for the built-in passes.

mod function;
mod instruction;
mod module;
mod writer;

pub use function::*;
pub use instruction::*;
pub use module::*;
pub use writer::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functions_record_their_module() {
        let mut m1 = Module::new("one");
        let m2 = Module::new("two");
        let f = m1.declare_function("puts", 1);

        assert_eq!(m1.function(f).module(), m1.identity());
        assert_ne!(m1.function(f).module(), m2.identity());
    }

    #[test]
    fn builder_numbers_values_after_params() {
        let mut m = Module::new("test");
        let mut b = m.define_function("add", 2, Linkage::Public);
        let (lhs, rhs) = (b.param(0), b.param(1));
        let sum = b.binary(BinaryOp::Add, lhs, rhs);
        b.ret(Some(sum));
        let f = b.define();

        assert_eq!(sum, Value::new(2));
        assert!(!m.function(f).is_declaration());
        assert_eq!(m.function(f).body().unwrap().insts().len(), 2);
    }

    #[test]
    fn functions_iterate_in_declaration_order() {
        let mut m = Module::new("test");
        let a = m.declare_function("a", 0);
        let b = m.declare_function("b", 0);
        let c = m.declare_function("c", 0);

        assert_eq!(m.functions().collect::<Vec<_>>(), vec![a, b, c]);

        m.remove_function(b);

        assert_eq!(m.functions().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(m.find_function_by_name("b"), None);
        assert_eq!(m.function(c).name(), "c");
    }

    #[test]
    fn writer_output() {
        let mut m = Module::new("test");
        m.declare_function("puts", 1);

        let mut b = m.define_function("main", 0, Linkage::Private);
        let x = b.iconst(5);
        let y = b.call("puts", &[x]);
        b.ret(Some(y));
        b.define();

        let expected = "; module `test`\n\
                        \n\
                        declare @puts(%0)\n\
                        \n\
                        private fn @main() {\n\
                        \x20 %0 = const 5\n\
                        \x20 %1 = call @puts(%0)\n\
                        \x20 ret %1\n\
                        }\n";

        assert_eq!(stringify_module(&m), expected);
    }
}
