//! Page discovery and the concurrent build pool.
//!
//! Discovery unions every non-`_`-prefixed `.md` and `.html` file under the
//! configured content sources into one page set keyed by relative path. Each
//! page then becomes one independent unit of work: front matter, permalink,
//! both render stages, post-processing, and the final write all happen inside
//! the worker, and any failure there is recorded in the page's outcome
//! without disturbing sibling pages. The pool is rayon's; the caller blocks
//! until every page has completed.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value as Json};

use crate::assets::AssetResolver;
use crate::config::Config;
use crate::frontmatter;
use crate::permalink;
use crate::render::{render_page, Engine, PageKind, RenderError};

/// One discovered content page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Content-source-relative path, `/`-separated, extension stripped.
    pub key: String,
    pub source: PathBuf,
    pub kind: PageKind,
}

/// Why a single page was dropped from the output. Confined to its worker;
/// never escalates to a build error.
#[derive(Debug, thiserror::Error)]
pub enum PageFailure {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The per-page record the scheduler hands back: log lines plus an optional
/// failure.
#[derive(Debug)]
pub struct PageOutcome {
    pub source: PathBuf,
    pub log: Vec<String>,
    pub failure: Option<PageFailure>,
}

#[derive(Debug, Clone, Copy)]
pub struct Summary {
    /// Pages dispatched, failed ones included.
    pub pages: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Pure string-to-string HTML rewrites applied after the layout stage, in
/// order: newline canonicalization, minify, prettify. Disabled filters are
/// pass-through.
#[derive(Default)]
pub struct Postprocess {
    pub minify: Option<HtmlFilter>,
    pub prettify: Option<HtmlFilter>,
}

pub type HtmlFilter = std::sync::Arc<dyn Fn(&str) -> String + Send + Sync>;

impl Postprocess {
    pub fn apply(&self, html: String) -> String {
        let html = html.replace("\r\n", "\n").replace('\r', "\n");
        let html = match &self.minify {
            Some(filter) => filter(&html),
            None => html,
        };

        match &self.prettify {
            Some(filter) => filter(&html),
            None => html,
        }
    }
}

/// Discovers the full page set. Extensions are probed in `.md`, `.html`
/// order across every configured content source; a later discovery with an
/// already-seen key replaces the earlier page and records a collision
/// warning. Within a content source the theme's directory is scanned before
/// the site's, so a site page shadows the theme's.
pub fn discover(config: &Config, resolver: &AssetResolver) -> (Vec<Page>, Vec<String>) {
    let mut pages: Vec<Page> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut warnings = Vec::new();

    for (ext, kind) in [("md", PageKind::Markdown), ("html", PageKind::Html)] {
        for source in config.content_sources() {
            for dir in resolver.dirs(&source, true) {
                for (key, path) in content_files(&dir, ext) {
                    let page = Page { key: key.clone(), source: path, kind };
                    match index.get(&key).copied() {
                        Some(i) => {
                            warnings.push(format!(
                                "page `{key}`: {} replaces {}",
                                page.source.display(),
                                pages[i].source.display(),
                            ));
                            pages[i] = page;
                        }
                        None => {
                            index.insert(key, pages.len());
                            pages.push(page);
                        }
                    }
                }
            }
        }
    }

    (pages, warnings)
}

/// Recursively lists `*.<ext>` files under `dir`, skipping any path with a
/// `_`-prefixed component, as `(page key, absolute path)` pairs in sorted
/// order.
fn content_files(dir: &Path, ext: &str) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();
    for entry in jwalk::WalkDir::new(dir).sort(true) {
        let Ok(entry) = entry else { continue };
        if !entry.file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(dir) else { continue };
        if let Some(key) = page_key(relative) {
            files.push((key, path));
        }
    }

    files
}

/// The page key for a content-source-relative path: components joined with
/// `/`, final extension stripped. `None` for `_`-prefixed files or
/// directories.
fn page_key(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if part.starts_with('_') {
                    return None;
                }

                parts.push(part.into_owned());
            }
            _ => return None,
        }
    }

    if let Some(last) = parts.last_mut() {
        if let Some(dot) = last.rfind('.') {
            last.truncate(dot);
        }
    }

    Some(parts.join("/"))
}

/// Everything a worker needs, shared read-only across the pool.
pub struct Scheduler<'a> {
    pub engine: &'a dyn Engine,
    pub globals: &'a Map<String, Json>,
    pub srcdir: &'a Path,
    pub dstdir: &'a Path,
    pub postprocess: &'a Postprocess,
    /// Compile pages one at a time on the calling thread. Output is
    /// byte-identical to the parallel run.
    pub sequential: bool,
}

impl Scheduler<'_> {
    /// Compiles every page, blocking until the pool drains. Per-page
    /// failures are captured in the outcomes, never raised.
    pub fn run(&self, pages: &[Page]) -> (Vec<PageOutcome>, Summary) {
        let start = Instant::now();
        let outcomes: Vec<PageOutcome> = match self.sequential {
            true => pages.iter().map(|page| self.compile(page)).collect(),
            false => pages.par_iter().map(|page| self.compile(page)).collect(),
        };

        let summary = Summary {
            pages: outcomes.len(),
            failed: outcomes.iter().filter(|o| o.failure.is_some()).count(),
            elapsed: start.elapsed(),
        };

        (outcomes, summary)
    }

    fn compile(&self, page: &Page) -> PageOutcome {
        let display = page.source.strip_prefix(self.srcdir).unwrap_or(&page.source);
        let mut outcome = PageOutcome {
            source: page.source.clone(),
            log: vec![format!("compiling {}", display.display())],
            failure: None,
        };

        let text = match std::fs::read_to_string(&page.source) {
            Ok(text) => text,
            Err(source) => return outcome.fail(PageFailure::Read {
                path: page.source.clone(),
                source,
            }),
        };

        let doc = frontmatter::parse(&text);
        let link = permalink::resolve(&page.key, &doc.header);
        outcome.log.push(format!("permalink: {link}"));

        let html = match render_page(self.engine, page.kind, &doc, &link, self.globals) {
            Ok(html) => html,
            Err(error) => return outcome.fail(error.into()),
        };

        let html = self.postprocess.apply(html);
        let target = self.dstdir.join(permalink::output_path(&link));
        if target.exists() {
            outcome.log.push(format!(
                "warning: overwriting existing file {}",
                target.display(),
            ));
        }

        if let Err(source) = write_page(&target, &html) {
            return outcome.fail(PageFailure::Write { path: target, source });
        }

        outcome
    }
}

/// Writes one page, creating parent directories as needed. Creation must be
/// create-if-missing: sibling workers race on shared ancestors.
fn write_page(target: &Path, html: &str) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(target, html)
}

impl PageOutcome {
    fn fail(mut self, failure: PageFailure) -> PageOutcome {
        self.log.push(format!("error: {failure}"));
        self.failure = Some(failure);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Mapping;

    fn touch(path: &Path, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn site(config: &str) -> (tempfile::TempDir, Config, AssetResolver) {
        let root = tempfile::tempdir().unwrap();
        let config = match serde_yaml::from_str(config).unwrap() {
            serde_yaml::Value::Mapping(raw) => Config::from_mapping(raw),
            _ => Config::from_mapping(Mapping::new()),
        };

        let theme = config.theme_dir(root.path());
        let resolver = AssetResolver::new(root.path(), theme);
        (root, config, resolver)
    }

    #[test]
    fn page_keys() {
        assert_eq!(page_key(Path::new("a/b/c.md")).unwrap(), "a/b/c");
        assert_eq!(page_key(Path::new("index.html")).unwrap(), "index");
        assert_eq!(page_key(Path::new("_draft.md")), None);
        assert_eq!(page_key(Path::new("_partials/x.md")), None);
        assert_eq!(page_key(Path::new("a.b/c.d.md")).unwrap(), "a.b/c.d");
    }

    #[test]
    fn discovers_recursively_across_sources() {
        let (root, config, resolver) = site("content: [pages, posts]");
        touch(&root.path().join("pages/index.md"), "");
        touch(&root.path().join("pages/sub/deep.md"), "");
        touch(&root.path().join("posts/one.html"), "");
        touch(&root.path().join("posts/_hidden.md"), "");

        let (pages, warnings) = discover(&config, &resolver);
        let mut keys: Vec<_> = pages.iter().map(|p| p.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, ["index", "one", "sub/deep"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn collision_is_replaced_and_warned() {
        let (root, config, resolver) = site("content: pages");
        touch(&root.path().join("pages/about.md"), "md");
        touch(&root.path().join("pages/about.html"), "html");

        let (pages, warnings) = discover(&config, &resolver);
        assert_eq!(pages.len(), 1);
        // `.html` is probed after `.md`, so it wins the key.
        assert_eq!(pages[0].kind, PageKind::Html);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("about"), "in: {}", warnings[0]);
    }

    #[test]
    fn colliding_permalinks_warn_and_still_compile() {
        use crate::render::MiniJinjaEngine;

        let root = tempfile::tempdir().unwrap();
        let layouts = root.path().join("layouts");
        touch(&layouts.join("default.html"), "{{ content }}");
        touch(&root.path().join("pages/a.md"), "---\npermalink: same.html\n---\nfirst");
        touch(&root.path().join("pages/b.md"), "---\npermalink: same.html\n---\nsecond");

        let engine = MiniJinjaEngine::new(vec![layouts]);
        let globals = Map::new();
        let postprocess = Postprocess::default();
        let out = root.path().join("public");
        let scheduler = Scheduler {
            engine: &engine,
            globals: &globals,
            srcdir: root.path(),
            dstdir: &out,
            postprocess: &postprocess,
            sequential: true,
        };

        let page = |name: &str| Page {
            key: name.into(),
            source: root.path().join(format!("pages/{name}.md")),
            kind: PageKind::Markdown,
        };

        let (outcomes, summary) = scheduler.run(&[page("a"), page("b")]);
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.failed, 0);

        // The second worker finds the first one's file and warns; the write
        // still proceeds.
        assert!(!outcomes[0].log.iter().any(|l| l.contains("overwriting")));
        assert!(outcomes[1].log.iter().any(|l| l.contains("overwriting")));
        let html = std::fs::read_to_string(out.join("same.html")).unwrap();
        assert_eq!(html, "<p>second</p>");
    }

    #[test]
    fn site_page_shadows_theme_page() {
        let (root, config, resolver) = site("theme: t\ncontent: pages");
        touch(&root.path().join("themes/t/pages/a.md"), "theme");
        touch(&root.path().join("pages/a.md"), "site");

        let (pages, warnings) = discover(&config, &resolver);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source, root.path().join("pages/a.md"));
        assert_eq!(warnings.len(), 1);
    }
}
