//! Per-template asset and hook registrations.
//!
//! The index maps a template name to the CSS/JS fragments and hooks that
//! ride with it: whenever that name appears in a page's dependency closure,
//! its entries are included. The reserved empty-string key holds entries
//! global to every page; keeping the two tiers separate (rather than one
//! flat list) is what lets collection put globals first.

use crate::assets::{Asset, AssetKind};
use crate::error::HookError;
use crate::headers::{RequestContext, ResponseHeaders};
use crate::value::Value;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Key under which global (every-page) entries are registered.
pub const GLOBAL: &str = "";

/// Transforms render data before template execution; may replace it
/// entirely.
pub type Prehook = Arc<
    dyn Fn(&mut dyn ResponseHeaders, &RequestContext, Value) -> Result<Value, HookError>
        + Send
        + Sync,
>;

/// Runs after the rendered output is flushed.
pub type Posthook =
    Arc<dyn Fn(&mut dyn ResponseHeaders, &RequestContext) -> Result<(), HookError> + Send + Sync>;

/// Everything registered against one template name.
#[derive(Clone, Default)]
pub struct IndexEntry {
    pub css: SmallVec<[Arc<Asset>; 2]>,
    pub js: SmallVec<[Arc<Asset>; 2]>,
    pub prehooks: SmallVec<[Prehook; 1]>,
    pub posthooks: SmallVec<[Posthook; 1]>,
}

/// Assets and hooks keyed by the template name they ride with.
///
/// Populated at bootstrap, read-only afterwards.
#[derive(Default)]
pub struct DependencyIndex {
    entries: FxHashMap<String, IndexEntry>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_asset(&mut self, template: &str, kind: AssetKind, asset: Arc<Asset>) {
        let entry = self.entries.entry(template.to_string()).or_default();
        match kind {
            AssetKind::Css => entry.css.push(asset),
            AssetKind::Js => entry.js.push(asset),
        }
    }

    pub fn add_prehook(&mut self, template: &str, hook: Prehook) {
        self.entries
            .entry(template.to_string())
            .or_default()
            .prehooks
            .push(hook);
    }

    pub fn add_posthook(&mut self, template: &str, hook: Posthook) {
        self.entries
            .entry(template.to_string())
            .or_default()
            .posthooks
            .push(hook);
    }

    pub fn entry(&self, template: &str) -> Option<&IndexEntry> {
        self.entries.get(template)
    }

    /// Entries included in every page.
    pub fn global(&self) -> Option<&IndexEntry> {
        self.entry(GLOBAL)
    }
}
