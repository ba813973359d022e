//! Crate error taxonomy.

use std::io;
use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Every failure is returned to the caller, never swallowed. Translating
/// these into HTTP status codes or user-visible messages is the host's job.
#[derive(Debug, Error)]
pub enum Error {
    /// A CSS/JS resource could not be read from the resource provider.
    #[error("failed to load asset `{name}`")]
    AssetLoad {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Malformed template syntax.
    #[error("parse error in `{name}` at line {line}, column {column}: {message}")]
    Parse {
        name: String,
        line: u32,
        column: u32,
        message: String,
    },

    /// A template was invoked or requested but never registered.
    ///
    /// A dangling invocation is a hard error: a silently skipped dependency
    /// would also silently drop the CSS/JS/hooks registered against it.
    #[error("template `{referenced_name}` was referenced from {} but not found", .referenced_from.as_deref().unwrap_or("the render request"))]
    TemplateNotFound {
        referenced_name: String,
        /// Name of the template containing the invocation, or `None` when
        /// the name was requested directly by the caller.
        referenced_from: Option<String>,
    },

    /// A prehook or posthook returned a failure.
    #[error("hook failed: {0}")]
    Hook(#[from] HookError),

    /// Template execution itself failed, e.g. a missing required data field.
    #[error("failed to render `{template}`: {message}")]
    Render { template: String, message: String },
}

/// Failure raised by a host-authored prehook or posthook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_asset_load_display() {
        let err = Error::AssetLoad {
            name: "site.css".into(),
            source: io::Error::new(ErrorKind::NotFound, "no such file"),
        };
        let display = format!("{err}");
        assert!(display.contains("site.css"));
    }

    #[test]
    fn test_template_not_found_display() {
        let direct = Error::TemplateNotFound {
            referenced_name: "home".into(),
            referenced_from: None,
        };
        assert!(format!("{direct}").contains("the render request"));

        let nested = Error::TemplateNotFound {
            referenced_name: "footer".into(),
            referenced_from: Some("layout".into()),
        };
        assert!(format!("{nested}").contains("layout"));
    }

    #[test]
    fn test_hook_error_converts() {
        fn fails() -> Result<(), Error> {
            Err(HookError::new("nope"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, Error::Hook(_)));
        assert!(format!("{err}").contains("nope"));
    }
}
