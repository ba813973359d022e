//! Ordered, deduplicated asset and hook collection.

use crate::assets::{Asset, AssetStore};
use crate::error::Error;
use crate::index::{DependencyIndex, GLOBAL, IndexEntry, Posthook, Prehook};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// The asset and hook lists for one composed page.
#[derive(Default)]
pub struct Collected {
    pub css: Vec<Arc<Asset>>,
    pub js: Vec<Arc<Asset>>,
    pub prehooks: Vec<Prehook>,
    pub posthooks: Vec<Posthook>,
}

impl std::fmt::Debug for Collected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collected")
            .field("css", &self.css)
            .field("js", &self.js)
            .field("prehooks", &self.prehooks.len())
            .field("posthooks", &self.posthooks.len())
            .finish()
    }
}

/// Gather CSS/JS and hooks for `names` (a resolved dependency closure, in
/// order), then for the explicitly requested `extra_css`/`extra_js` file
/// names.
///
/// Global entries come first, so they render and execute before specifics.
/// CSS and JS are deduplicated by content hash across the entire
/// collection; hooks are appended unconditionally (the same hook registered
/// against two dependencies is assumed intentional).
pub fn collect(
    index: &DependencyIndex,
    names: &[String],
    store: &AssetStore,
    extra_css: &[String],
    extra_js: &[String],
) -> Result<Collected, Error> {
    let mut out = Collected::default();
    let mut seen_css: FxHashSet<[u8; 32]> = FxHashSet::default();
    let mut seen_js: FxHashSet<[u8; 32]> = FxHashSet::default();

    let keys = std::iter::once(GLOBAL).chain(names.iter().map(String::as_str));
    for key in keys {
        let Some(entry) = index.entry(key) else {
            continue;
        };
        append_entry(entry, &mut out, &mut seen_css, &mut seen_js);
    }

    for name in extra_css {
        let asset = store.load(name)?;
        if seen_css.insert(asset.hash) {
            out.css.push(asset);
        }
    }
    for name in extra_js {
        let asset = store.load(name)?;
        if seen_js.insert(asset.hash) {
            out.js.push(asset);
        }
    }
    Ok(out)
}

fn append_entry(
    entry: &IndexEntry,
    out: &mut Collected,
    seen_css: &mut FxHashSet<[u8; 32]>,
    seen_js: &mut FxHashSet<[u8; 32]>,
) {
    for asset in &entry.css {
        if seen_css.insert(asset.hash) {
            out.css.push(asset.clone());
        }
    }
    for asset in &entry.js {
        if seen_js.insert(asset.hash) {
            out.js.push(asset.clone());
        }
    }
    out.prehooks.extend(entry.prehooks.iter().cloned());
    out.posthooks.extend(entry.posthooks.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetKind, MemoryProvider};
    use crate::index::GLOBAL;

    fn store() -> AssetStore {
        AssetStore::new(Arc::new(
            MemoryProvider::new()
                .with("extra.css", "p { color: red }")
                .with("extra.js", "go()"),
        ))
    }

    fn add(index: &mut DependencyIndex, template: &str, kind: AssetKind, content: &str) {
        index.add_asset(
            template,
            kind,
            Arc::new(Asset::from_bytes(content.as_bytes().to_vec())),
        );
    }

    #[test]
    fn test_globals_come_first() {
        let mut index = DependencyIndex::new();
        add(&mut index, "home", AssetKind::Css, "h {}");
        add(&mut index, GLOBAL, AssetKind::Css, "g {}");
        let collected = collect(&index, &["home".into()], &store(), &[], &[]).unwrap();
        assert_eq!(collected.css.len(), 2);
        assert_eq!(collected.css[0].content, b"g {}");
        assert_eq!(collected.css[1].content, b"h {}");
    }

    #[test]
    fn test_identical_content_collapses() {
        let mut index = DependencyIndex::new();
        // two names, byte-identical content
        add(&mut index, "a", AssetKind::Css, "same {}");
        add(&mut index, "b", AssetKind::Css, "same {}");
        let collected =
            collect(&index, &["a".into(), "b".into()], &store(), &[], &[]).unwrap();
        assert_eq!(collected.css.len(), 1);
    }

    #[test]
    fn test_css_js_dedup_independently() {
        let mut index = DependencyIndex::new();
        add(&mut index, "a", AssetKind::Css, "x");
        add(&mut index, "a", AssetKind::Js, "x");
        let collected = collect(&index, &["a".into()], &store(), &[], &[]).unwrap();
        assert_eq!(collected.css.len(), 1);
        assert_eq!(collected.js.len(), 1);
    }

    #[test]
    fn test_hooks_not_deduplicated() {
        let mut index = DependencyIndex::new();
        let hook: Prehook = Arc::new(|_, _, data| Ok(data));
        index.add_prehook("a", hook.clone());
        index.add_prehook("b", hook);
        let collected =
            collect(&index, &["a".into(), "b".into()], &store(), &[], &[]).unwrap();
        assert_eq!(collected.prehooks.len(), 2);
    }

    #[test]
    fn test_extra_files_append_last_with_dedup() {
        let mut index = DependencyIndex::new();
        add(&mut index, "home", AssetKind::Css, "p { color: red }");
        let collected = collect(
            &index,
            &["home".into()],
            &store(),
            &["extra.css".into()],
            &["extra.js".into()],
        )
        .unwrap();
        // extra.css is byte-identical to home's asset and collapses
        assert_eq!(collected.css.len(), 1);
        assert_eq!(collected.js.len(), 1);
        assert_eq!(collected.js[0].content, b"go()");
    }

    #[test]
    fn test_missing_extra_file_fails() {
        let index = DependencyIndex::new();
        let err = collect(&index, &[], &store(), &["ghost.css".into()], &[]).unwrap_err();
        assert!(matches!(err, Error::AssetLoad { .. }));
    }
}
