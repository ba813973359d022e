//! Page composition and the fingerprint-keyed cache.
//!
//! A composed page is built once per distinct ordered document set and
//! memoized. Construction happens outside any lock: two concurrent misses
//! for the same fingerprint may both build, and the second insertion wins —
//! both constructions are pure functions of the same registry and index
//! state, so the races differ only in wasted work, never in meaning.

use crate::assets::{Asset, AssetKind, AssetStore};
use crate::collect::collect;
use crate::error::Error;
use crate::index::{DependencyIndex, Posthook, Prehook};
use crate::log;
use crate::registry::TemplateRegistry;
use crate::resolve::resolve;
use crate::template::{ExecOptions, ParsedTemplate};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A fully composed, executable page: the merged template instance plus its
/// ordered asset and hook lists.
pub struct Page {
    pub(crate) template: ParsedTemplate,
    pub(crate) root: String,
    pub css: Vec<Arc<Asset>>,
    pub js: Vec<Arc<Asset>>,
    pub(crate) prehooks: Vec<Prehook>,
    pub(crate) posthooks: Vec<Posthook>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("template", &self.template)
            .field("root", &self.root)
            .field("css", &self.css)
            .field("js", &self.js)
            .field("prehooks", &self.prehooks.len())
            .field("posthooks", &self.posthooks.len())
            .finish()
    }
}

/// Cache key: the ordered list of requested document names.
pub fn fingerprint(primary: &str, auxiliaries: &[&str]) -> String {
    let mut key = String::from(primary);
    for name in auxiliaries {
        key.push('\n');
        key.push_str(name);
    }
    key
}

/// Fingerprint-keyed page cache. Shared across all concurrent render calls.
pub struct PageCache {
    enabled: bool,
    pages: RwLock<FxHashMap<String, Arc<Page>>>,
}

impl PageCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pages: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<Arc<Page>> {
        if !self.enabled {
            return None;
        }
        self.pages.read().get(fingerprint).cloned()
    }

    /// Insert under the write lock, held only for the insertion itself.
    /// Last writer wins on duplicate concurrent construction.
    pub fn insert(&self, fingerprint: String, page: Arc<Page>) {
        if !self.enabled {
            return;
        }
        self.pages.write().insert(fingerprint, page);
    }

    /// Drop every cached page. The only eviction mechanism.
    pub fn invalidate(&self) {
        self.pages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}

/// Return the cached page for the requested document set, building and
/// memoizing it on a miss.
pub(crate) fn get_or_build(
    cache: &PageCache,
    registry: &TemplateRegistry,
    index: &DependencyIndex,
    store: &AssetStore,
    options: ExecOptions,
    primary: &str,
    auxiliaries: &[&str],
) -> Result<Arc<Page>, Error> {
    let key = fingerprint(primary, auxiliaries);
    if let Some(page) = cache.get(&key) {
        return Ok(page);
    }
    let page = Arc::new(build(registry, index, store, options, primary, auxiliaries)?);
    cache.insert(key, page.clone());
    Ok(page)
}

fn build(
    registry: &TemplateRegistry,
    index: &DependencyIndex,
    store: &AssetStore,
    options: ExecOptions,
    primary: &str,
    auxiliaries: &[&str],
) -> Result<Page, Error> {
    let (aux_docs, extra_css, extra_js) = categorize(auxiliaries);

    // Independent copy of the common tree; per-instance options must not
    // reach the shared original.
    let mut merged = registry.common().clone();
    merged.set_options(options);
    graft(&mut merged, registry, primary)?;
    for name in &aux_docs {
        graft(&mut merged, registry, name)?;
    }

    let names = resolve(&merged, primary)?;
    let collected = collect(index, &names, store, &extra_css, &extra_js)?;

    log!(
        "compose";
        "built `{primary}` ({} templates, {} css, {} js)",
        names.len(),
        collected.css.len(),
        collected.js.len()
    );

    Ok(Page {
        template: merged,
        root: primary.to_string(),
        css: collected.css,
        js: collected.js,
        prehooks: collected.prehooks,
        posthooks: collected.posthooks,
    })
}

/// Merge the document registered under `name` into the composed instance.
/// A name with no library entry is fine as long as the common tree already
/// defines it; otherwise the request itself is dangling.
fn graft(
    merged: &mut ParsedTemplate,
    registry: &TemplateRegistry,
    name: &str,
) -> Result<(), Error> {
    match registry.lookup(name) {
        Some(document) => {
            merged.merge(document);
            Ok(())
        }
        None if merged.contains(name) => Ok(()),
        None => Err(Error::TemplateNotFound {
            referenced_name: name.to_string(),
            referenced_from: None,
        }),
    }
}

/// Split requested names into template documents and explicit CSS/JS files
/// by extension.
fn categorize(names: &[&str]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut docs = Vec::new();
    let mut css = Vec::new();
    let mut js = Vec::new();
    for name in names {
        match AssetKind::from_name(name) {
            Some(AssetKind::Css) => css.push(name.to_string()),
            Some(AssetKind::Js) => js.push(name.to_string()),
            None => docs.push(name.to_string()),
        }
    }
    (docs, css, js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryProvider;

    fn store() -> AssetStore {
        AssetStore::new(Arc::new(MemoryProvider::new().with("p.css", "p {}")))
    }

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry
            .register_common("layout", r#"{{define "layout"}}<html>{{end}}"#)
            .unwrap();
        registry
            .register_document("home", r#"{{template "layout"}}<main/>"#)
            .unwrap();
        registry
            .register_document("aside", r#"{{define "aside"}}<aside/>{{end}}"#)
            .unwrap();
        registry
    }

    #[test]
    fn test_fingerprint_is_ordered_join() {
        assert_eq!(fingerprint("home", &[]), "home");
        assert_eq!(fingerprint("home", &["a", "b.css"]), "home\na\nb.css");
        assert_ne!(fingerprint("home", &["a", "b"]), fingerprint("home", &["b", "a"]));
    }

    #[test]
    fn test_build_and_cache() {
        let cache = PageCache::new(true);
        let registry = registry();
        let index = DependencyIndex::new();
        let store = store();
        let options = ExecOptions::default();

        let first =
            get_or_build(&cache, &registry, &index, &store, options, "home", &[]).unwrap();
        assert_eq!(cache.len(), 1);
        let second =
            get_or_build(&cache, &registry, &index, &store, options, "home", &[]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cache_disabled_rebuilds() {
        let cache = PageCache::new(false);
        let registry = registry();
        let index = DependencyIndex::new();
        let store = store();
        let options = ExecOptions::default();

        let first =
            get_or_build(&cache, &registry, &index, &store, options, "home", &[]).unwrap();
        let second =
            get_or_build(&cache, &registry, &index, &store, options, "home", &[]).unwrap();
        assert!(cache.is_empty());
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_clone_does_not_touch_shared_base() {
        let cache = PageCache::new(true);
        let registry = registry();
        let index = DependencyIndex::new();
        let store = store();
        let options = ExecOptions {
            missing_key: crate::config::MissingKey::Error,
        };

        let page =
            get_or_build(&cache, &registry, &index, &store, options, "home", &[]).unwrap();
        assert!(matches!(
            page.template.options().missing_key,
            crate::config::MissingKey::Error
        ));
        // the registry's shared instances keep their defaults
        assert!(matches!(
            registry.common().options().missing_key,
            crate::config::MissingKey::Empty
        ));
        assert!(!registry.common().contains("home"));
    }

    #[test]
    fn test_auxiliary_document_grafted() {
        let cache = PageCache::new(true);
        let registry = registry();
        let index = DependencyIndex::new();
        let store = store();

        let page = get_or_build(
            &cache,
            &registry,
            &index,
            &store,
            ExecOptions::default(),
            "home",
            &["aside", "p.css"],
        )
        .unwrap();
        assert!(page.template.contains("aside"));
        assert_eq!(page.css.len(), 1);
    }

    #[test]
    fn test_unknown_document_fails() {
        let cache = PageCache::new(true);
        let registry = registry();
        let index = DependencyIndex::new();
        let store = store();

        let err = get_or_build(
            &cache,
            &registry,
            &index,
            &store,
            ExecOptions::default(),
            "ghost",
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
    }

    #[test]
    fn test_invalidate_clears() {
        let cache = PageCache::new(true);
        let registry = registry();
        let index = DependencyIndex::new();
        let store = store();

        get_or_build(
            &cache,
            &registry,
            &index,
            &store,
            ExecOptions::default(),
            "home",
            &[],
        )
        .unwrap();
        assert_eq!(cache.len(), 1);
        cache.invalidate();
        assert!(cache.is_empty());
    }
}
