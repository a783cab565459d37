//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Func, FuncBuilder, Function, Linkage};
use crate::transforms;
use crate::utility::SaHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

static NEXT_MODULE_IDENTITY: AtomicU64 = AtomicU64::new(0);

/// Used to identify different [`Module`] instances efficiently.
///
/// Every [`Module`] is handed a process-unique identity when it is created,
/// and every [`Function`] records the identity of the module it was created in.
///
/// Note that this is not a way of telling if modules are *equivalent*,
/// this is a way of identifying the *same module*.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ModuleIdentity(u64);

impl ModuleIdentity {
    fn fresh() -> Self {
        Self(NEXT_MODULE_IDENTITY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Contains all the data necessary for a single module of IR.
///
/// Functions are kept in declaration order, and that is the order
/// that every pass visits them in.
#[derive(Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize))]
pub struct Module {
    identity: ModuleIdentity,
    name: String,
    functions: Vec<Function>,
    #[cfg_attr(feature = "enable-serde", serde(skip))]
    names: SaHashMap<String, Func>,
    next_func: u32,
}

impl Module {
    /// Creates a new, empty module with a given name.
    pub fn new(name: &str) -> Self {
        Self {
            identity: ModuleIdentity::fresh(),
            name: name.to_owned(),
            functions: Vec::default(),
            names: SaHashMap::default(),
            next_func: 0,
        }
    }

    /// Gets the name of the module.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a [`ModuleIdentity`] that refers to the object.
    #[inline]
    pub fn identity(&self) -> ModuleIdentity {
        self.identity
    }

    /// Resolves a [`Func`] into a real function object.
    ///
    /// # Panics
    /// Panics if `func` does not refer to a function in this module.
    pub fn function(&self, func: Func) -> &Function {
        let index = self.index_of(func);

        &self.functions[index]
    }

    /// Resolves a [`Func`] into a real function object.
    ///
    /// # Panics
    /// Panics if `func` does not refer to a function in this module.
    pub fn function_mut(&mut self, func: Func) -> &mut Function {
        let index = self.index_of(func);

        &mut self.functions[index]
    }

    /// Finds a [`Func`] with a given name. If the function has not been added to
    /// the module, `None` is returned.
    pub fn find_function_by_name(&self, name: &str) -> Option<Func> {
        self.names.get(name).copied()
    }

    /// Declares a public function without providing it a definition. It can be defined
    /// later with [`Self::define_existing_function`], or it can be left
    /// as-is if the function is external.
    pub fn declare_function(&mut self, name: &str, params: u32) -> Func {
        self.declare_with_linkage(name, params, Linkage::Public)
    }

    /// Declares and then defines a new function.
    pub fn define_function(&mut self, name: &str, params: u32, linkage: Linkage) -> FuncBuilder<'_> {
        let func = self.declare_with_linkage(name, params, linkage);

        self.define_existing_function(func)
    }

    /// Returns a [`FuncBuilder`] that will create a body for a previously-declared
    /// function.
    ///
    /// If the function already has a body, using the builder will completely
    /// replace the previous body.
    pub fn define_existing_function(&mut self, func: Func) -> FuncBuilder<'_> {
        FuncBuilder::new(self, func)
    }

    /// Removes a function from the module, returning it. Other functions
    /// keep their [`Func`]s.
    pub fn remove_function(&mut self, func: Func) -> Option<Function> {
        let index = self.functions.iter().position(|f| f.func() == func)?;
        let removed = self.functions.remove(index);

        self.names.remove(removed.name());

        Some(removed)
    }

    /// Returns an iterator over all of the functions in the module, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = Func> + '_ {
        self.functions.iter().map(Function::func)
    }

    /// Returns an iterator over the function objects themselves, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Function> + '_ {
        self.functions.iter()
    }

    /// Returns a mutable iterator over the function objects, in declaration order.
    pub fn functions_mut(&mut self) -> impl Iterator<Item = &mut Function> + '_ {
        self.functions.iter_mut()
    }

    /// Gets the number of functions (declared or defined) in the module.
    #[inline]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Checks the entire module for internal consistency.
    ///
    /// See [`verify_module`](crate::transforms::verify_module) for the
    /// list of problems if this returns `false`.
    pub fn verify(&self) -> bool {
        transforms::verify_module(self).is_ok()
    }

    fn declare_with_linkage(&mut self, name: &str, params: u32, linkage: Linkage) -> Func {
        debug_assert!(self.find_function_by_name(name).is_none());

        let func = Func::new(self.next_func);
        let new = Function::new(name.to_owned(), func, self.identity, linkage, params);

        self.next_func += 1;
        self.functions.push(new);
        self.names.insert(name.to_owned(), func);

        func
    }

    fn index_of(&self, func: Func) -> usize {
        self.functions
            .iter()
            .position(|f| f.func() == func)
            .expect("`Func` does not belong to this module")
    }
}
