//! Two-stage page rendering behind an injectable template engine.
//!
//! The content stage renders the page's own body as an inline template, so a
//! page may reference `config`, its header fields, or `permalink` in its own
//! markup. Markdown pages are then converted to HTML. The layout stage stores
//! the result under `content` and renders the `<layout>.html` template looked
//! up on the layout search path. Either stage failing produces a
//! [`RenderError`] tagged with the failing stage; nothing here panics or
//! aborts more than the page at hand.

use std::fmt;
use std::path::PathBuf;

use minijinja::{AutoEscape, Environment, ErrorKind};
use serde_json::Value as Json;

use crate::frontmatter::Document;
use crate::markdown;
use crate::value::{key_string, yaml_to_json};

/// What post-processing a page's rendered content receives, decided by its
/// source file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// `.md`: the content stage output runs through the markdown converter.
    Markdown,
    /// `.html`: the content stage output is used verbatim.
    Html,
}

impl PageKind {
    pub fn from_extension(ext: &str) -> Option<PageKind> {
        match ext {
            "md" => Some(PageKind::Markdown),
            "html" => Some(PageKind::Html),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Content,
    Layout,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Content => f.write_str("content"),
            Stage::Layout => f.write_str("layout"),
        }
    }
}

/// A template failure confined to one page.
#[derive(Debug, Clone, thiserror::Error)]
#[error("rendering page {stage} failed: {message}")]
pub struct RenderError {
    pub stage: Stage,
    pub message: String,
}

/// An error from the injected template engine, flattened to its full cause
/// chain.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(String);

impl From<minijinja::Error> for EngineError {
    fn from(error: minijinja::Error) -> Self {
        use std::error::Error as _;
        use std::fmt::Write as _;

        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = write!(message, ": {cause}");
            source = cause.source();
        }

        EngineError(message)
    }
}

/// The template-rendering capability consumed by the page pipeline. Engines
/// are shared across workers and must be freely callable from any of them.
pub trait Engine: Send + Sync {
    /// Compiles `source` as a one-off template and renders it.
    fn render_str(&self, source: &str, context: &Json) -> Result<String, EngineError>;

    /// Renders the named template found on the layout search path.
    fn render_named(&self, name: &str, context: &Json) -> Result<String, EngineError>;
}

/// MiniJinja-backed [`Engine`] with a loader over an ordered list of layout
/// directories; the first directory containing the requested name wins.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new(layout_dirs: Vec<PathBuf>) -> MiniJinjaEngine {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_loader(move |name| {
            if name.split(['/', '\\']).any(|part| part == "..") {
                return Ok(None);
            }

            for dir in &layout_dirs {
                let path = dir.join(name);
                if path.is_file() {
                    return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                        minijinja::Error::new(
                            ErrorKind::InvalidOperation,
                            format!("failed to read template {}: {e}", path.display()),
                        )
                    });
                }
            }

            Ok(None)
        });

        MiniJinjaEngine { env }
    }
}

impl Engine for MiniJinjaEngine {
    fn render_str(&self, source: &str, context: &Json) -> Result<String, EngineError> {
        Ok(self.env.render_str(source, context)?)
    }

    fn render_named(&self, name: &str, context: &Json) -> Result<String, EngineError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}

/// Renders one page through both stages against a fresh context merged from
/// `globals`, the page header, and the permalink (later overrides earlier).
pub fn render_page(
    engine: &dyn Engine,
    kind: PageKind,
    doc: &Document,
    permalink: &str,
    globals: &serde_json::Map<String, Json>,
) -> Result<String, RenderError> {
    let mut merged = globals.clone();
    for (key, value) in &doc.header {
        merged.insert(key_string(key), yaml_to_json(value));
    }

    merged.insert("permalink".into(), Json::String(permalink.into()));
    let mut context = Json::Object(merged);

    let content = engine
        .render_str(doc.body.trim(), &context)
        .map_err(|e| RenderError { stage: Stage::Content, message: e.to_string() })?;

    let content = match kind {
        PageKind::Markdown => markdown::convert(&content),
        PageKind::Html => content,
    };

    if let Json::Object(map) = &mut context {
        map.insert("content".into(), Json::String(content));
    }

    let layout = format!("{}.html", doc.layout());
    engine
        .render_named(&layout, &context)
        .map_err(|e| RenderError { stage: Stage::Layout, message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter;
    use serde_json::{json, Map};

    fn engine_with_layouts(layouts: &[(&str, &str)]) -> (tempfile::TempDir, MiniJinjaEngine) {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in layouts {
            std::fs::write(dir.path().join(name), text).unwrap();
        }

        let engine = MiniJinjaEngine::new(vec![dir.path().to_path_buf()]);
        (dir, engine)
    }

    fn globals() -> Map<String, Json> {
        let mut globals = Map::new();
        globals.insert("mwb".into(), json!({ "version": "test" }));
        globals.insert("config".into(), json!({ "title": "Site" }));
        globals
    }

    #[test]
    fn two_stage_render() {
        let (_dir, engine) =
            engine_with_layouts(&[("default.html", "<main>{{ content }}</main>")]);
        let doc = frontmatter::parse("---\nname: World\n---\n# Hello {{ name }}\n");
        let html =
            render_page(&engine, PageKind::Markdown, &doc, "/hello.html", &globals()).unwrap();
        assert_eq!(html, "<main><h1>Hello World</h1></main>");
    }

    #[test]
    fn page_sees_globals_and_permalink() {
        let (_dir, engine) = engine_with_layouts(&[("default.html", "{{ content }}")]);
        let doc = frontmatter::parse("{{ config.title }} at {{ permalink }}");
        let html = render_page(&engine, PageKind::Html, &doc, "/x/", &globals()).unwrap();
        assert_eq!(html, "Site at /x/");
    }

    #[test]
    fn header_overrides_globals() {
        let (_dir, engine) = engine_with_layouts(&[("default.html", "{{ config.title }}")]);
        let doc = frontmatter::parse("---\nconfig: {title: Mine}\n---\nx");
        let html = render_page(&engine, PageKind::Html, &doc, "/", &globals()).unwrap();
        assert_eq!(html, "Mine");
    }

    #[test]
    fn layout_from_header() {
        let (_dir, engine) = engine_with_layouts(&[
            ("default.html", "D:{{ content }}"),
            ("post.html", "P:{{ content }}"),
        ]);
        let doc = frontmatter::parse("---\nlayout: post\n---\nbody");
        let html = render_page(&engine, PageKind::Html, &doc, "/", &globals()).unwrap();
        assert_eq!(html, "P:body");
    }

    #[test]
    fn content_stage_failure() {
        let (_dir, engine) = engine_with_layouts(&[("default.html", "{{ content }}")]);
        let doc = frontmatter::parse("{% endfor %}");
        let error = render_page(&engine, PageKind::Html, &doc, "/", &globals()).unwrap_err();
        assert_eq!(error.stage, Stage::Content);
    }

    #[test]
    fn missing_layout_is_layout_failure() {
        let (_dir, engine) = engine_with_layouts(&[]);
        let doc = frontmatter::parse("body");
        let error = render_page(&engine, PageKind::Html, &doc, "/", &globals()).unwrap_err();
        assert_eq!(error.stage, Stage::Layout);
    }

    #[test]
    fn html_page_is_not_markdown_converted() {
        let (_dir, engine) = engine_with_layouts(&[("default.html", "{{ content }}")]);
        let doc = frontmatter::parse("# not a heading");
        let html = render_page(&engine, PageKind::Html, &doc, "/", &globals()).unwrap();
        assert_eq!(html, "# not a heading");
    }

    #[test]
    fn no_auto_escaping_in_layouts() {
        let (_dir, engine) = engine_with_layouts(&[("default.html", "{{ content }}")]);
        let doc = frontmatter::parse("<em>hi</em>");
        let html = render_page(&engine, PageKind::Html, &doc, "/", &globals()).unwrap();
        assert_eq!(html, "<em>hi</em>");
    }
}
