//! Layered asset resolution across the site tree and its theme.
//!
//! Every asset category (`layouts`, `stylesheets`, `static`, or a content
//! source) may exist in the site tree, the theme tree, both, or neither. The
//! resolver yields only directories that exist, in a per-category precedence
//! order. For named lookup the theme is scanned first and the site second,
//! with later hits replacing earlier ones: a site asset shadows the theme's
//! asset of the same name.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AssetResolver {
    site: PathBuf,
    theme: PathBuf,
}

impl AssetResolver {
    pub fn new(site: impl Into<PathBuf>, theme: impl Into<PathBuf>) -> AssetResolver {
        AssetResolver { site: site.into(), theme: theme.into() }
    }

    /// The ordered, existing directories for `category`. With `theme_first`
    /// the theme tree precedes the site tree; otherwise the site tree comes
    /// first. A category absent from both trees yields an empty vector.
    pub fn dirs(&self, category: &str, theme_first: bool) -> Vec<PathBuf> {
        let sources = match theme_first {
            true => [&self.theme, &self.site],
            false => [&self.site, &self.theme],
        };

        sources
            .into_iter()
            .map(|source| source.join(category))
            .filter(|dir| dir.is_dir())
            .collect()
    }

    /// Locates every non-`_`-prefixed file named `*.<ext>` directly under the
    /// `category` directories, keyed by file name without the extension. The
    /// theme is scanned first so that a site file of the same name wins.
    /// Entries keep first-discovery order; within a directory, names are
    /// sorted.
    pub fn named(&self, category: &str, ext: &str) -> Vec<(String, PathBuf)> {
        let mut assets: Vec<(String, PathBuf)> = Vec::new();
        for dir in self.dirs(category, true) {
            for path in sorted_files(&dir) {
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };

                if file_name.starts_with('_') || !file_name.ends_with(ext) {
                    continue;
                }

                let name = file_name[..file_name.len() - ext.len()].to_string();
                match assets.iter_mut().find(|(existing, _)| *existing == name) {
                    Some((_, existing_path)) => *existing_path = path,
                    None => assets.push((name, path)),
                }
            }
        }

        assets
    }
}

fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect(),
        Err(_) => Vec::new(),
    };

    files.sort();
    files
}
