//! The minimal template language: parse trees, parsing and execution.
//!
//! Only the invocation construct (`{{template "name"}}`) is structurally
//! meaningful to the rest of the engine — the dependency resolver walks it
//! to discover the closure of templates a page will execute. The remaining
//! constructs (interpolation, conditionals, iteration, helpers) exist so a
//! composed tree is actually executable, and stay opaque to everything
//! outside this module.

mod ast;
mod exec;
mod parse;

pub use ast::{FieldPath, Node, Tree};
pub use exec::ExecOptions;
pub use parse::{Parsed, parse};

use crate::error::{Error, HookError};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A render-scoped helper function, applicable as `{{name .path}}`.
pub type HelperFn = Arc<dyn Fn(&Value) -> Result<Value, HookError> + Send + Sync>;

/// A set of named parse trees plus the execution options and helper
/// functions scoped to one instance.
///
/// The registry's shared trees are never executed directly: composition
/// clones them (`Clone` deep-copies every owned tree) so per-instance
/// options and helpers cannot leak back into the shared original.
#[derive(Clone, Default)]
pub struct ParsedTemplate {
    trees: FxHashMap<String, Tree>,
    options: ExecOptions,
    funcs: FxHashMap<String, HelperFn>,
}

impl ParsedTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named tree.
    pub fn insert(&mut self, tree: Tree) {
        self.trees.insert(tree.name.clone(), tree);
    }

    pub fn tree(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.trees.contains_key(name)
    }

    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.values()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Graft every tree (and helper) of `other` into this instance,
    /// replacing same-named entries.
    pub fn merge(&mut self, other: &ParsedTemplate) {
        for tree in other.trees.values() {
            self.trees.insert(tree.name.clone(), tree.clone());
        }
        for (name, func) in &other.funcs {
            self.funcs.insert(name.clone(), func.clone());
        }
    }

    pub fn options(&self) -> ExecOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ExecOptions) {
        self.options = options;
    }

    pub fn add_func(&mut self, name: impl Into<String>, func: HelperFn) {
        self.funcs.insert(name.into(), func);
    }

    pub fn func(&self, name: &str) -> Option<&HelperFn> {
        self.funcs.get(name)
    }

    /// Execute the tree named `root` against `data`, appending to `out`.
    pub fn execute(&self, root: &str, data: &Value, out: &mut String) -> Result<(), Error> {
        exec::execute(self, root, data, out)
    }
}

impl fmt::Debug for ParsedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ParsedTemplate")
            .field("trees", &names)
            .field("options", &self.options)
            .field("funcs", &self.funcs.len())
            .finish()
    }
}
