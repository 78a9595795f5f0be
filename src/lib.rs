//! A theme-aware static website builder.
//!
//! `mwb` compiles a source tree of content files (YAML front matter over
//! markdown or HTML) into a static output directory, layering the site's
//! own assets over a shareable theme. A build runs as follows:
//!
//! 1. `website.yaml` is read and the theme under `themes/<name>/` resolved.
//! 2. The output directory is cleared; `static/` trees are copied, theme
//!    first so site files win.
//! 3. SCSS stylesheets compile to `assets/css/`, with configuration values
//!    in scope as SCSS variables.
//! 4. Every page under the content sources is compiled on a worker pool:
//!    front matter, permalink, a content-stage render of the page body, a
//!    layout-stage render of `<layout>.html`, then minify and write.
//!
//! A page that fails to render is logged and dropped; sibling pages and the
//! build as a whole carry on. Only an unusable output directory aborts a
//! build.

pub mod error;
pub mod value;
pub mod config;
pub mod assets;
pub mod frontmatter;
pub mod permalink;
pub mod markdown;
pub mod render;
pub mod stylesheets;
pub mod scheduler;
pub mod builder;

pub use builder::{BuildOptions, WebsiteBuilder};
pub use error::{Error, Result};
pub use scheduler::Summary;

/// The tool version, exposed to templates as `mwb.version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
