//! The build orchestrator.
//!
//! [`WebsiteBuilder`] owns the build lifecycle: clear and recreate the output
//! directory (the one fatal, build-aborting step), copy static assets from
//! theme then site, compile stylesheets, assemble the global render
//! variables, and hand the page set to the scheduler. Everything the workers
//! see (configuration, resolver, globals, engine) is frozen before the pool
//! starts.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value as Json};

use crate::assets::AssetResolver;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::render::MiniJinjaEngine;
use crate::scheduler::{self, HtmlFilter, PageOutcome, Postprocess, Scheduler, Summary};
use crate::stylesheets::{StylesheetCompiler, CSS_SUBDIR};

pub struct BuildOptions {
    /// Print the per-page compilation log.
    pub verbose: bool,
    /// Suppress all non-fatal output, failure logs included.
    pub silent: bool,
    /// Minify the final HTML of every page.
    pub minify: bool,
    /// An extra HTML rewrite applied after minification; pass-through when
    /// unset. No prettifier ships with the tool.
    pub prettify: Option<HtmlFilter>,
    /// Compile pages one at a time instead of on the worker pool.
    pub sequential: bool,
}

impl Default for BuildOptions {
    fn default() -> BuildOptions {
        BuildOptions {
            verbose: false,
            silent: false,
            minify: true,
            prettify: None,
            sequential: false,
        }
    }
}

pub struct WebsiteBuilder {
    srcdir: PathBuf,
    config: Config,
    resolver: AssetResolver,
    options: BuildOptions,
    reporter: Reporter,
}

impl WebsiteBuilder {
    /// Reads the site's configuration and resolves its theme. The source
    /// directory is not otherwise touched until [`build`](Self::build).
    pub fn new(srcdir: impl Into<PathBuf>, options: BuildOptions) -> Result<WebsiteBuilder> {
        let srcdir = srcdir.into();
        let config = Config::load(&srcdir)?;
        let resolver = AssetResolver::new(&srcdir, config.theme_dir(&srcdir));
        let reporter = Reporter { silent: options.silent, verbose: options.verbose };
        Ok(WebsiteBuilder { srcdir, config, resolver, options, reporter })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one full build into `dstdir`, which is cleared first. Returns
    /// the aggregate summary; per-page failures are counted there, not
    /// raised.
    pub fn build(&self, dstdir: &Path) -> Result<Summary> {
        self.reporter.phase(format!("Preparing output directory {}", dstdir.display()));
        self.prepare_output(dstdir)?;

        self.reporter.phase("Copying static files");
        self.copy_static(dstdir)?;

        self.reporter.phase("Compiling stylesheets");
        let stylesheets = self.compile_stylesheets(dstdir)?;

        self.reporter.phase("Compiling pages");
        let globals = self.globals(stylesheets);
        let engine = MiniJinjaEngine::new(self.resolver.dirs("layouts", false));
        let (pages, warnings) = scheduler::discover(&self.config, &self.resolver);
        for warning in &warnings {
            self.reporter.phase(format!("warning: {warning}"));
        }

        let postprocess = Postprocess {
            minify: self.options.minify.then(minify_filter),
            prettify: self.options.prettify.clone(),
        };

        let scheduler = Scheduler {
            engine: &engine,
            globals: &globals,
            srcdir: &self.srcdir,
            dstdir,
            postprocess: &postprocess,
            sequential: self.options.sequential,
        };

        let (outcomes, summary) = scheduler.run(&pages);
        for outcome in &outcomes {
            self.reporter.page(outcome);
        }

        self.reporter.phase(format!(
            "Compiled {} pages in {:.2}s ({} failed)",
            summary.pages,
            summary.elapsed.as_secs_f64(),
            summary.failed,
        ));

        Ok(summary)
    }

    fn prepare_output(&self, dstdir: &Path) -> Result<()> {
        let fatal = |source| Error::OutputDir { path: dstdir.to_path_buf(), source };
        if dstdir.exists() {
            std::fs::remove_dir_all(dstdir).map_err(fatal)?;
        }

        std::fs::create_dir_all(dstdir).map_err(fatal)
    }

    /// Theme first, site second: a site file overwrites the theme's copy.
    fn copy_static(&self, dstdir: &Path) -> Result<()> {
        for dir in self.resolver.dirs("static", true) {
            copy_tree(&dir, dstdir)
                .map_err(|source| Error::StaticAssets { path: dir.clone(), source })?;
        }

        Ok(())
    }

    fn compile_stylesheets(&self, dstdir: &Path) -> Result<Json> {
        let css_dir = dstdir.join(CSS_SUBDIR);
        std::fs::create_dir_all(&css_dir)?;

        let compiler = StylesheetCompiler::new(&self.config, &self.resolver);
        let mut index = Map::new();
        for (name, path) in self.resolver.named("stylesheets", ".scss") {
            let display = path.strip_prefix(&self.srcdir).unwrap_or(&path);
            self.reporter.detail(format!("compiling {}", display.display()));

            let css = compiler.compile(&name, &path)?;
            std::fs::write(css_dir.join(format!("{name}.css")), css)?;
            index.insert(name.clone(), json!({ "path": format!("/{CSS_SUBDIR}/{name}.css") }));
        }

        Ok(Json::Object(index))
    }

    /// The variables every page's render context starts from.
    fn globals(&self, stylesheets: Json) -> Map<String, Json> {
        let mut globals = Map::new();
        globals.insert("mwb".into(), json!({ "version": crate::VERSION }));
        globals.insert("config".into(), self.config.to_json());
        globals.insert("stylesheets".into(), stylesheets);
        globals
    }
}

fn minify_filter() -> HtmlFilter {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;

    std::sync::Arc::new(move |html: &str| {
        String::from_utf8_lossy(&minify_html::minify(html.as_bytes(), &cfg)).into_owned()
    })
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in jwalk::WalkDir::new(src).sort(true) {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(src) else { continue };
        let target = dst.join(relative);
        if entry.file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::copy(&path, &target)?;
        }
    }

    Ok(())
}

/// Stdout reporting with three volume levels: silent suppresses
/// everything non-fatal, verbose adds the per-page log, failures print
/// whenever not silent.
#[derive(Debug, Clone, Copy)]
struct Reporter {
    silent: bool,
    verbose: bool,
}

impl Reporter {
    fn phase(&self, message: impl AsRef<str>) {
        if !self.silent {
            println!("{}", message.as_ref());
        }
    }

    fn detail(&self, message: impl AsRef<str>) {
        if !self.silent {
            println!("\t> {}", message.as_ref());
        }
    }

    fn page(&self, outcome: &PageOutcome) {
        if self.silent || (!self.verbose && outcome.failure.is_none()) {
            return;
        }

        let mut lines = outcome.log.iter();
        if let Some(first) = lines.next() {
            println!("\t> {first}");
        }

        for line in lines {
            println!("\t  {line}");
        }
    }
}
