//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Maps pass names to passes, so that pipelines can be described as text.
//!
//! A textual pipeline is a comma-separated list of pass names, e.g.
//! `constfold,dce,globaldce`. Function passes that are next to each other
//! share one function pipeline, a `|` ends the current function pipeline
//! early: `constfold|dce` runs `constfold` over every function before
//! `dce` runs over any of them.

use crate::pass::{Pass, PassManager};
use crate::transforms::*;
use thiserror::Error;

/// Errors from building a pipeline out of text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A name in the pipeline didn't match any registered pass.
    #[error("unknown pass `{0}`")]
    UnknownPass(String),
}

struct PassEntry {
    name: &'static str,
    description: &'static str,
    create: Box<dyn Fn() -> Pass>,
}

/// A table of every pass that can be named in a textual pipeline.
#[derive(Default)]
pub struct PassRegistry {
    entries: Vec<PassEntry>,
}

impl PassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in pass registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register("constfold", "fold arithmetic on constants", || {
            Pass::function(ConstantFoldPass)
        });
        registry.register("dce", "remove unused pure instructions", || {
            Pass::function(DeadCodeEliminationPass)
        });
        registry.register("globaldce", "remove unreachable private functions", || {
            Pass::module(GlobalDeadCodeEliminationPass)
        });
        registry.register("print", "print the module to stdout", || {
            Pass::module(ModuleWriterPass::stdout())
        });
        registry.register("verify-function", "verify each function", || {
            Pass::function(FunctionVerifierPass)
        });
        registry.register("verify-module", "verify the entire module", || {
            Pass::module(ModuleVerifierPass)
        });

        registry
    }

    /// Registers a pass under `name`. A previous registration with the same
    /// name is replaced.
    pub fn register<F>(&mut self, name: &'static str, description: &'static str, create: F)
    where
        F: Fn() -> Pass + 'static,
    {
        let entry = PassEntry {
            name,
            description,
            create: Box::new(create),
        };

        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Creates a new instance of the pass registered under `name`.
    pub fn create(&self, name: &str) -> Result<Pass, PipelineError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| (entry.create)())
            .ok_or_else(|| PipelineError::UnknownPass(name.to_owned()))
    }

    /// Returns an iterator over the name and description of every registered pass,
    /// in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().map(|entry| (entry.name, entry.description))
    }

    /// Adds every pass named in `pipeline` to `pm`, in order.
    ///
    /// Nothing is added if any name is unknown.
    pub fn build_pipeline(&self, pipeline: &str, pm: &mut PassManager) -> Result<(), PipelineError> {
        let mut groups = Vec::default();

        for group in pipeline.split('|') {
            let passes = group
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| self.create(name))
                .collect::<Result<Vec<_>, _>>()?;

            groups.push(passes);
        }

        for (i, passes) in groups.into_iter().enumerate() {
            if i != 0 {
                pm.end_function_pipeline();
            }

            for pass in passes {
                pm.add_pass(pass);
            }
        }

        tracing::debug!(%pipeline, built = %pm, "built pipeline");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::PassKind;

    #[test]
    fn builtins_are_registered() {
        let registry = PassRegistry::with_builtins();
        let names: Vec<_> = registry.entries().map(|(name, _)| name).collect();

        assert_eq!(
            names,
            vec!["constfold", "dce", "globaldce", "print", "verify-function", "verify-module"]
        );
        assert_eq!(registry.create("dce").unwrap().kind(), PassKind::Function);
        assert_eq!(registry.create("globaldce").unwrap().kind(), PassKind::Module);
    }

    #[test]
    fn unknown_passes() {
        let registry = PassRegistry::with_builtins();
        let mut pm = PassManager::new(false);
        let err = registry.build_pipeline("constfold,mem2reg", &mut pm).unwrap_err();

        assert_eq!(err, PipelineError::UnknownPass("mem2reg".to_owned()));
        assert_eq!(err.to_string(), "unknown pass `mem2reg`");
        assert!(pm.passes().is_empty());
    }

    #[test]
    fn textual_pipelines() {
        let registry = PassRegistry::with_builtins();
        let mut pm = PassManager::new(false);

        registry
            .build_pipeline("constfold, dce | dce,globaldce", &mut pm)
            .unwrap();

        assert_eq!(pm.to_string(), "function(constfold,dce),function(dce),globaldce");
    }

    #[test]
    fn registrations_replace() {
        let mut registry = PassRegistry::new();

        registry.register("x", "first", || Pass::function(ConstantFoldPass));
        registry.register("x", "second", || Pass::module(GlobalDeadCodeEliminationPass));

        assert_eq!(registry.entries().collect::<Vec<_>>(), vec![("x", "second")]);
        assert_eq!(registry.create("x").unwrap().name(), "globaldce");
    }
}
