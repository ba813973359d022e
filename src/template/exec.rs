//! Execution of composed parse trees against a data value.

use crate::config::MissingKey;
use crate::error::Error;
use crate::template::ParsedTemplate;
use crate::template::ast::{FieldPath, Node};
use crate::value::Value;

/// Runaway-recursion backstop for mutually invoking templates.
const MAX_INVOKE_DEPTH: usize = 1024;

/// Per-instance execution options.
///
/// Set on a composed clone, never on the shared registry trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    pub missing_key: MissingKey,
}

pub(super) fn execute(
    template: &ParsedTemplate,
    root: &str,
    data: &Value,
    out: &mut String,
) -> Result<(), Error> {
    let exec = Executor { template, root };
    let tree = template
        .tree(root)
        .ok_or_else(|| exec.fail(format!("no parse tree named `{root}`")))?;
    exec.run_nodes(&tree.root, data, out, 0)
}

struct Executor<'t> {
    template: &'t ParsedTemplate,
    /// Name of the tree execution started from, for error reporting.
    root: &'t str,
}

impl Executor<'_> {
    fn run_nodes(
        &self,
        nodes: &[Node],
        data: &Value,
        out: &mut String,
        depth: usize,
    ) -> Result<(), Error> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Field(path) => {
                    if let Some(value) = self.lookup(path, data)? {
                        push_value(value, out);
                    }
                }
                Node::Invoke(name) => {
                    if depth >= MAX_INVOKE_DEPTH {
                        return Err(self.fail(format!(
                            "exceeded maximum template invocation depth at `{name}`"
                        )));
                    }
                    let tree = self.template.tree(name).ok_or_else(|| {
                        self.fail(format!("invoked template `{name}` is not part of this page"))
                    })?;
                    self.run_nodes(&tree.root, data, out, depth + 1)?;
                }
                Node::Call { func, arg } => {
                    let helper = self
                        .template
                        .func(func)
                        .ok_or_else(|| self.fail(format!("no helper function `{func}`")))?;
                    let arg = match self.lookup(arg, data)? {
                        Some(value) => value.clone(),
                        None => Value::Null,
                    };
                    let result =
                        helper(&arg).map_err(|e| self.fail(format!("helper `{func}`: {e}")))?;
                    push_value(&result, out);
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let truthy = self
                        .lookup(cond, data)?
                        .map(Value::truthy)
                        .unwrap_or(false);
                    let branch = if truthy { then } else { otherwise };
                    self.run_nodes(branch, data, out, depth)?;
                }
                Node::Range { over, body } => match self.lookup(over, data)? {
                    Some(Value::Array(items)) => {
                        for item in items {
                            self.run_nodes(body, item, out, depth)?;
                        }
                    }
                    Some(Value::Null) | None => {}
                    Some(other) => {
                        return Err(self.fail(format!(
                            "range over `{over}` needs an array, found {}",
                            kind_name(other)
                        )));
                    }
                },
            }
        }
        Ok(())
    }

    /// Resolve `path` against `data`. `Ok(None)` means the key is absent and
    /// the options allow rendering nothing in its place.
    fn lookup<'v>(&self, path: &FieldPath, data: &'v Value) -> Result<Option<&'v Value>, Error> {
        match data.get_path(&path.0) {
            Some(value) => Ok(Some(value)),
            None => match self.template.options().missing_key {
                MissingKey::Empty => Ok(None),
                MissingKey::Error => {
                    Err(self.fail(format!("data has no entry for key `{path}`")))
                }
            },
        }
    }

    fn fail(&self, message: String) -> Error {
        Error::Render {
            template: self.root.to_string(),
            message,
        }
    }
}

fn push_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
