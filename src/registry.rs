//! Template registration: the shared common tree and the document library.
//!
//! Common templates merge into one always-included tree; documents parse
//! standalone and wait in the library until a render requests them. Neither
//! is ever executed directly — composition clones what it needs.

use crate::error::Error;
use crate::log;
use crate::template::{ParsedTemplate, Tree, parse};
use regex::Regex;
use rustc_hash::FxHashMap;

/// A registered template text, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub name: String,
    pub raw_text: String,
    pub is_common: bool,
}

#[derive(Debug, Default)]
pub struct TemplateRegistry {
    common: ParsedTemplate,
    documents: FxHashMap<String, ParsedTemplate>,
    sources: Vec<TemplateSource>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and add every block it defines to the shared common tree.
    pub fn register_common(&mut self, name: &str, text: &str) -> Result<(), Error> {
        let parsed = parse(name, text)?;
        if !is_self_naming(name, text) {
            self.common.insert(Tree {
                name: name.to_string(),
                root: parsed.outer,
            });
        }
        for tree in parsed.defines {
            self.common.insert(tree);
        }
        self.sources.push(TemplateSource {
            name: name.to_string(),
            raw_text: text.to_string(),
            is_common: true,
        });
        log!("registry"; "common `{name}` registered");
        Ok(())
    }

    /// Parse `text` standalone and store it in the document library under
    /// `name` for on-demand inclusion.
    pub fn register_document(&mut self, name: &str, text: &str) -> Result<(), Error> {
        let parsed = parse(name, text)?;
        let mut template = ParsedTemplate::new();
        if !is_self_naming(name, text) {
            template.insert(Tree {
                name: name.to_string(),
                root: parsed.outer,
            });
        }
        for tree in parsed.defines {
            template.insert(tree);
        }
        self.documents.insert(name.to_string(), template);
        self.sources.push(TemplateSource {
            name: name.to_string(),
            raw_text: text.to_string(),
            is_common: false,
        });
        log!("registry"; "document `{name}` registered");
        Ok(())
    }

    /// The document-scoped template, if one was registered. Callers fall
    /// back to checking the common tree.
    pub fn lookup(&self, name: &str) -> Option<&ParsedTemplate> {
        self.documents.get(name)
    }

    pub fn common(&self) -> &ParsedTemplate {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut ParsedTemplate {
        &mut self.common
    }

    /// Whether `name` resolves to anything at all (library or common tree).
    pub fn knows(&self, name: &str) -> bool {
        self.documents.contains_key(name) || self.common.contains(name)
    }

    pub fn sources(&self) -> &[TemplateSource] {
        &self.sources
    }
}

/// A text that defines a block named exactly after its own outer name is
/// self-naming; wrapping it in a second synthetic tree would leave the outer
/// name defined but unreachable.
fn is_self_naming(name: &str, text: &str) -> bool {
    let pattern = format!(r#"\{{\{{\s*define\s+"{}"\s*\}}\}}"#, regex::escape(name));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}
