//! The engine facade: registration API and the render pipeline.
//!
//! One [`Engine`] value owns all state — registry, dependency index, asset
//! store, page cache and buffer pool. There is no ambient module-level
//! state anywhere; the host constructs the engine at startup, registers
//! templates/assets/hooks, then shares it by reference across request
//! handlers. Registration takes `&mut self`, so the "bootstrap calls are
//! not safe concurrently with render" contract is enforced by the borrow
//! checker rather than by documentation.

use crate::assets::{Asset, AssetKind, AssetStore, ResourceProvider};
use crate::bufpool::BufferPool;
use crate::compose::{self, Page, PageCache};
use crate::config::EngineConfig;
use crate::csp;
use crate::error::{Error, HookError};
use crate::headers::{RequestContext, ResponseHeaders};
use crate::index::DependencyIndex;
use crate::registry::TemplateRegistry;
use crate::template::ExecOptions;
use crate::value::Value;
use std::io;
use std::sync::Arc;

pub struct Engine {
    registry: TemplateRegistry,
    index: DependencyIndex,
    store: AssetStore,
    cache: PageCache,
    pool: BufferPool,
    config: EngineConfig,
}

impl Engine {
    pub fn new(provider: Arc<dyn ResourceProvider>, config: EngineConfig) -> Engine {
        Engine {
            registry: TemplateRegistry::new(),
            index: DependencyIndex::new(),
            store: AssetStore::new(provider),
            cache: PageCache::new(config.cache),
            pool: BufferPool::new(config.pool_size, config.buffer_capacity),
            config,
        }
    }

    // ------------------------------------------------------------------
    // Bootstrap API
    // ------------------------------------------------------------------

    /// Parse `text` and merge its blocks into the common tree included in
    /// every composed page.
    pub fn register_common(&mut self, name: &str, text: &str) -> Result<(), Error> {
        self.registry.register_common(name, text)
    }

    /// Parse `text` as a standalone document available for rendering under
    /// `name`.
    pub fn register_document(&mut self, name: &str, text: &str) -> Result<(), Error> {
        self.registry.register_document(name, text)
    }

    /// [`register_common`](Self::register_common) reading the text from the
    /// engine's resource provider.
    pub fn register_common_file(&mut self, name: &str) -> Result<(), Error> {
        let text = self.store.read_text(name)?;
        self.registry.register_common(name, &text)
    }

    /// [`register_document`](Self::register_document) reading the text from
    /// the engine's resource provider.
    pub fn register_document_file(&mut self, name: &str) -> Result<(), Error> {
        let text = self.store.read_text(name)?;
        self.registry.register_document(name, &text)
    }

    /// Register an asset included in every page.
    pub fn register_global_asset(&mut self, kind: AssetKind, content: impl Into<Vec<u8>>) {
        self.register_asset_for("", kind, content);
    }

    /// Register an asset included whenever `template` is part of a page's
    /// dependency closure. The empty string targets every page.
    pub fn register_asset_for(
        &mut self,
        template: &str,
        kind: AssetKind,
        content: impl Into<Vec<u8>>,
    ) {
        self.index
            .add_asset(template, kind, Arc::new(Asset::from_bytes(content)));
    }

    /// Load `name` through the resource provider and register it against
    /// `template`, inferring the kind from the file extension.
    pub fn register_asset_file_for(&mut self, template: &str, name: &str) -> Result<(), Error> {
        let kind = AssetKind::from_name(name).ok_or_else(|| Error::AssetLoad {
            name: name.to_string(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "expected a .css or .js file name",
            ),
        })?;
        let asset = self.store.load(name)?;
        self.index.add_asset(template, kind, asset);
        Ok(())
    }

    /// Register a prehook against `template` (empty string for every page).
    pub fn register_prehook<F>(&mut self, template: &str, hook: F)
    where
        F: Fn(&mut dyn ResponseHeaders, &RequestContext, Value) -> Result<Value, HookError>
            + Send
            + Sync
            + 'static,
    {
        self.index.add_prehook(template, Arc::new(hook));
    }

    /// Register a posthook against `template` (empty string for every page).
    pub fn register_posthook<F>(&mut self, template: &str, hook: F)
    where
        F: Fn(&mut dyn ResponseHeaders, &RequestContext) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.index.add_posthook(template, Arc::new(hook));
    }

    /// Register a helper function usable as `{{name .path}}` in every
    /// composed page.
    pub fn register_function<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.registry.common_mut().add_func(name, Arc::new(func));
    }

    /// Drop every cached page. Call after registering at runtime.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Hot path
    // ------------------------------------------------------------------

    /// Render `primary` (plus any auxiliary documents and explicit
    /// `.css`/`.js` files) into `sink`.
    ///
    /// Prehooks may replace `data`; the first failing hook aborts the
    /// render before anything is written. Template execution targets a
    /// pooled buffer, so `sink` receives either the complete page or
    /// nothing. Posthooks run after the flush and their errors propagate
    /// without retracting output.
    pub fn render(
        &self,
        sink: &mut dyn io::Write,
        headers: &mut dyn ResponseHeaders,
        ctx: &RequestContext,
        data: Value,
        primary: &str,
        auxiliaries: &[&str],
    ) -> Result<(), Error> {
        let page = compose::get_or_build(
            &self.cache,
            &self.registry,
            &self.index,
            &self.store,
            self.exec_options(),
            primary,
            auxiliaries,
        )?;
        self.render_page(&page, sink, headers, ctx, data)
    }

    fn render_page(
        &self,
        page: &Page,
        sink: &mut dyn io::Write,
        headers: &mut dyn ResponseHeaders,
        ctx: &RequestContext,
        mut data: Value,
    ) -> Result<(), Error> {
        for hook in &page.prehooks {
            data = hook(headers, ctx, data)?;
        }

        csp::apply(headers, "style-src-elem", &page.css);
        csp::apply(headers, "script-src-elem", &page.js);

        if let Value::Object(map) = &mut data {
            map.insert("__css__".into(), Value::String(inline_styles(page)));
            map.insert("__js__".into(), Value::String(inline_scripts(page)));
            map.insert("__csp__".into(), Value::String(csp_meta(headers)));
        }

        let mut buf = self.pool.acquire();
        page.template.execute(&page.root, &data, &mut buf)?;
        sink.write_all(buf.as_bytes())
            .map_err(|e| Error::Render {
                template: page.root.clone(),
                message: format!("failed to flush output: {e}"),
            })?;
        drop(buf);

        for hook in &page.posthooks {
            hook(headers, ctx)?;
        }
        Ok(())
    }

    fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            missing_key: self.config.missing_key,
        }
    }
}

fn inline_styles(page: &Page) -> String {
    let mut out = String::new();
    for (i, asset) in page.css.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("<style>");
        out.push_str(&asset.text());
        out.push_str("</style>");
    }
    out
}

fn inline_scripts(page: &Page) -> String {
    let mut out = String::new();
    for (i, asset) in page.js.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("<script>");
        out.push_str(&asset.text());
        out.push_str("</script>");
    }
    out
}

/// Meta-tag mirror of the final CSP header, for templates that want to
/// repeat the policy in markup.
fn csp_meta(headers: &dyn ResponseHeaders) -> String {
    match headers.get(csp::CSP_HEADER) {
        Some(value) => {
            format!(r#"<meta http-equiv="Content-Security-Policy" content="{value}">"#)
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryProvider;
    use crate::headers::HeaderMap;
    use serde_json::json;

    fn engine() -> Engine {
        let provider = MemoryProvider::new()
            .with("home.html", r#"{{template "layout"}}"#)
            .with("site.css", "body { margin: 0 }");
        let mut engine = Engine::new(Arc::new(provider), EngineConfig::default());
        engine
            .register_common(
                "layout",
                r#"{{define "layout"}}<html>{{.title}}</html>{{end}}"#,
            )
            .unwrap();
        engine
    }

    fn render(engine: &Engine, primary: &str, data: serde_json::Value) -> (String, HeaderMap) {
        let mut sink = Vec::new();
        let mut headers = HeaderMap::new();
        engine
            .render(
                &mut sink,
                &mut headers,
                &RequestContext::new("GET", "/"),
                Value::from(data),
                primary,
                &[],
            )
            .unwrap();
        (String::from_utf8(sink).unwrap(), headers)
    }

    #[test]
    fn test_render_basic() {
        let mut engine = engine();
        engine
            .register_document("home", r#"{{template "layout"}}"#)
            .unwrap();
        let (output, _) = render(&engine, "home", json!({"title": "hi"}));
        assert_eq!(output, "<html>hi</html>");
    }

    #[test]
    fn test_file_backed_registration() {
        let mut engine = engine();
        engine.register_document_file("home.html").unwrap();
        engine.register_asset_file_for("home.html", "site.css").unwrap();
        let (output, headers) = render(&engine, "home.html", json!({"title": "x"}));
        assert_eq!(output, "<html>x</html>");
        assert!(headers.get(csp::CSP_HEADER).unwrap().contains("style-src-elem"));
    }

    #[test]
    fn test_asset_file_with_unknown_extension_rejected() {
        let mut engine = engine();
        assert!(engine.register_asset_file_for("x", "notes.txt").is_err());
    }

    #[test]
    fn test_helper_functions_available_in_pages() {
        let mut engine = engine();
        engine.register_function("upper", |value: &Value| match value {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            _ => Err(HookError::new("upper expects a string")),
        });
        engine
            .register_document("shout", "{{upper .word}}")
            .unwrap();
        let (output, _) = render(&engine, "shout", json!({"word": "quiet"}));
        assert_eq!(output, "QUIET");
    }

    #[test]
    fn test_helper_injection_skipped_for_non_object_data() {
        let mut engine = engine();
        engine.register_document("plain", "value: {{.}}").unwrap();
        engine.register_global_asset(AssetKind::Css, "p {}");
        let mut sink = Vec::new();
        let mut headers = HeaderMap::new();
        engine
            .render(
                &mut sink,
                &mut headers,
                &RequestContext::default(),
                Value::from("scalar"),
                "plain",
                &[],
            )
            .unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "value: scalar");
        // CSP still applies even though injection was skipped
        assert!(headers.get(csp::CSP_HEADER).is_some());
    }

    #[test]
    fn test_injected_helper_values() {
        let mut engine = engine();
        engine.register_global_asset(AssetKind::Css, "p { color: red }");
        engine
            .register_document("page", "{{.__css__}}|{{.__csp__}}")
            .unwrap();
        let (output, headers) = render(&engine, "page", json!({}));
        assert!(output.starts_with("<style>p { color: red }</style>|"));
        assert!(output.contains("http-equiv"));
        let header = headers.get(csp::CSP_HEADER).unwrap();
        assert!(output.contains(header));
    }

    #[test]
    fn test_invalidate_allows_reregistration() {
        let mut engine = engine();
        engine.register_document("home", "one").unwrap();
        let (first, _) = render(&engine, "home", json!({}));
        assert_eq!(first, "one");

        engine.register_document("home", "two").unwrap();
        engine.invalidate();
        let (second, _) = render(&engine, "home", json!({}));
        assert_eq!(second, "two");
    }
}
