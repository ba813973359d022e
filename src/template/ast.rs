//! Parse-tree node types.

use std::fmt;

/// A dotted field path, e.g. `.user.name`. An empty path is `.`, the
/// current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    /// The path addressing the current value (`.`).
    pub fn current() -> FieldPath {
        FieldPath(Vec::new())
    }

    pub fn is_current(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for segment in &self.0 {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// A single node in a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal output text.
    Text(String),
    /// `{{.path}}` interpolation of the addressed value.
    Field(FieldPath),
    /// `{{template "name"}}`: invoke another named template with the
    /// current data. The only construct the dependency resolver recognizes.
    Invoke(String),
    /// `{{func .path}}` application of a registered helper function.
    Call { func: String, arg: FieldPath },
    /// `{{if .path}}…{{else}}…{{end}}`
    If {
        cond: FieldPath,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    /// `{{range .path}}…{{end}}`; the body runs with `.` bound to each
    /// element in turn.
    Range { over: FieldPath, body: Vec<Node> },
}

/// A named parse tree: one `define` block, or a template text's top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub name: String,
    pub root: Vec<Node>,
}
