//! Content-addressed CSS/JS assets and the resource provider seam.
//!
//! An [`Asset`] pairs raw bytes with the SHA-256 of those bytes. The hash is
//! the asset's identity everywhere downstream: deduplication during
//! collection and the `'sha256-…'` allowlist tokens in the synthesized CSP
//! header both key on it, never on the originating file name.

use crate::error::Error;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::fs;
use std::sync::Arc;

/// Kind of an includable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    /// Infer the kind from a file name extension, `None` for anything that
    /// is not a `.css` or `.js` name.
    pub fn from_name(name: &str) -> Option<AssetKind> {
        let ext = Path::new(name).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(AssetKind::Css),
            "js" => Some(AssetKind::Js),
            _ => None,
        }
    }
}

/// An immutable CSS or JS fragment identified by the SHA-256 of its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content: Vec<u8>,
    pub hash: [u8; 32],
}

impl Asset {
    /// Build an asset from raw bytes, computing the content hash.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Asset {
        let content = content.into();
        let hash = sha256(&content);
        Asset { content, hash }
    }

    /// Content as text for inlining; invalid UTF-8 is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// CSP allowlist token for this asset.
    pub fn csp_token(&self) -> String {
        format!("'sha256-{}'", hex::encode(self.hash))
    }
}

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

// ============================================================================
// Resource providers
// ============================================================================

/// Source of raw bytes for named resources (template and asset files).
pub trait ResourceProvider: Send + Sync {
    /// Read the full contents of `name`.
    fn open(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// Filesystem provider rooted at a directory.
///
/// Names are slash-separated paths relative to the root; absolute paths and
/// `..` components are rejected before touching the filesystem.
#[derive(Debug, Clone)]
pub struct DirProvider {
    root: PathBuf,
}

impl DirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceProvider for DirProvider {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        if !valid_path(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid resource name `{name}`"),
            ));
        }
        fs::read(self.root.join(name))
    }
}

fn valid_path(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// In-memory provider for tests and embedded bundles.
#[derive(Debug, Default, Clone)]
pub struct MemoryProvider {
    files: FxHashMap<String, Vec<u8>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), content.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(name, content);
        self
    }
}

impl ResourceProvider for MemoryProvider {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no resource `{name}`"))
        })
    }
}

// ============================================================================
// Asset store
// ============================================================================

/// Loads named resources and wraps them as content-addressed assets.
///
/// The store itself does not cache: loading the same name twice re-reads the
/// provider and yields hash-identical results while the underlying content is
/// unchanged. Callers that want memoization layer it on top (the page cache
/// does exactly that).
pub struct AssetStore {
    provider: Arc<dyn ResourceProvider>,
}

impl AssetStore {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Load `name` and compute its content hash.
    pub fn load(&self, name: &str) -> Result<Arc<Asset>, Error> {
        let content = self.provider.open(name).map_err(|source| Error::AssetLoad {
            name: name.to_string(),
            source,
        })?;
        Ok(Arc::new(Asset::from_bytes(content)))
    }

    /// Load `name` as UTF-8 text (used for template sources).
    pub fn read_text(&self, name: &str) -> Result<String, Error> {
        let content = self.provider.open(name).map_err(|source| Error::AssetLoad {
            name: name.to_string(),
            source,
        })?;
        String::from_utf8(content).map_err(|e| Error::AssetLoad {
            name: name.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }
}
