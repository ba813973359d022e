//! weave - server-side template composition with content-addressed asset
//! bundling and Content-Security-Policy synthesis.
//!
//! A host HTTP layer registers template fragments, CSS/JS assets and hooks
//! once at bootstrap, then calls [`Engine::render`] per request. The engine
//! composes an executable page from the shared common tree plus the
//! requested documents, walks the result to find every transitively
//! invoked template, bundles the assets registered against those names
//! (deduplicated by content hash), and merges matching `'sha256-…'`
//! allowlist tokens into the response's CSP header.
//!
//! # Subsystems
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | [`assets`]   | Content-addressed assets and the resource provider   |
//! | [`registry`] | Common tree + document library                       |
//! | [`template`] | Parse trees, parsing and execution                   |
//! | [`resolve`]  | Dependency closure over invocation nodes             |
//! | [`collect`]  | Ordered, hash-deduplicated asset/hook collection     |
//! | [`compose`]  | Page composition and the fingerprint cache           |
//! | [`csp`]      | Structured CSP header synthesis                      |
//! | [`engine`]   | The facade tying it all together                     |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave::{Engine, EngineConfig, HeaderMap, MemoryProvider, RequestContext, Value};
//!
//! let provider = Arc::new(MemoryProvider::new());
//! let mut engine = Engine::new(provider, EngineConfig::default());
//! engine
//!     .register_common("layout", r#"{{define "layout"}}<p>{{.msg}}</p>{{end}}"#)
//!     .unwrap();
//! engine
//!     .register_document("home", r#"{{template "layout"}}"#)
//!     .unwrap();
//!
//! let mut sink = Vec::new();
//! let mut headers = HeaderMap::new();
//! let data = Value::from(serde_json::json!({"msg": "hello"}));
//! engine
//!     .render(
//!         &mut sink,
//!         &mut headers,
//!         &RequestContext::new("GET", "/"),
//!         data,
//!         "home",
//!         &[],
//!     )
//!     .unwrap();
//! assert_eq!(sink, b"<p>hello</p>");
//! ```

pub mod assets;
pub mod bufpool;
pub mod collect;
pub mod compose;
pub mod config;
pub mod csp;
pub mod engine;
pub mod error;
pub mod headers;
pub mod index;
pub mod logger;
pub mod registry;
pub mod resolve;
pub mod template;
pub mod value;

pub use assets::{Asset, AssetKind, AssetStore, DirProvider, MemoryProvider, ResourceProvider};
pub use compose::{Page, PageCache};
pub use config::{EngineConfig, MissingKey};
pub use engine::Engine;
pub use error::{Error, HookError};
pub use headers::{HeaderMap, RequestContext, ResponseHeaders};
pub use index::{DependencyIndex, Posthook, Prehook};
pub use registry::TemplateRegistry;
pub use value::Value;
