//! Site configuration: `website.yaml` (or `website.yml`) at the source root.
//!
//! The file is a free-form YAML mapping. Two keys, `theme` and `content`,
//! steer the build; the mapping as a whole is exposed to templates as
//! `config` and projected into SCSS variables. Loaded once per build and
//! shared read-only with every worker.

use std::path::{Path, PathBuf};

use serde_json::Value as Json;
use serde_yaml::{Mapping, Value as Yaml};

use crate::error::{Error, Result};
use crate::value::yaml_to_json;

pub const DEFAULT_THEME: &str = "default-theme";
pub const DEFAULT_CONTENT: &str = "pages";

#[derive(Debug, Clone, Default)]
pub struct Config {
    raw: Mapping,
}

impl Config {
    /// Reads `website.yaml` or `website.yml` from `srcdir`. A missing file is
    /// not an error: defaults apply. A file that exists but cannot be read or
    /// parsed as a mapping is fatal.
    pub fn load(srcdir: &Path) -> Result<Config> {
        for ext in ["yaml", "yml"] {
            let path = srcdir.join(format!("website.{ext}"));
            if !path.exists() {
                continue;
            }

            let text = std::fs::read_to_string(&path)
                .map_err(|source| Error::ConfigRead { path: path.clone(), source })?;

            let value: Yaml = serde_yaml::from_str(&text)
                .map_err(|source| Error::ConfigParse { path: path.clone(), source })?;

            return match value {
                Yaml::Mapping(raw) => Ok(Config { raw }),
                Yaml::Null => Ok(Config::default()),
                _ => Err(Error::ConfigNotAMapping { path }),
            };
        }

        Ok(Config::default())
    }

    pub fn from_mapping(raw: Mapping) -> Config {
        Config { raw }
    }

    /// The configured theme name, `default-theme` when unset.
    pub fn theme(&self) -> &str {
        self.raw
            .get("theme")
            .and_then(Yaml::as_str)
            .unwrap_or(DEFAULT_THEME)
    }

    /// The theme's asset tree: `<srcdir>/themes/<name>`.
    pub fn theme_dir(&self, srcdir: &Path) -> PathBuf {
        srcdir.join("themes").join(self.theme())
    }

    /// Content-source directory names, in declaration order. `content` may be
    /// a single name or a list of names; defaults to `pages`.
    pub fn content_sources(&self) -> Vec<String> {
        match self.raw.get("content") {
            Some(Yaml::String(name)) => vec![name.clone()],
            Some(Yaml::Sequence(names)) => names
                .iter()
                .filter_map(Yaml::as_str)
                .map(str::to_string)
                .collect(),
            _ => vec![DEFAULT_CONTENT.to_string()],
        }
    }

    pub fn raw(&self) -> &Mapping {
        &self.raw
    }

    /// The whole configuration as a JSON object, for the render context.
    pub fn to_json(&self) -> Json {
        yaml_to_json(&Yaml::Mapping(self.raw.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> Config {
        match serde_yaml::from_str(yaml).unwrap() {
            Yaml::Mapping(raw) => Config::from_mapping(raw),
            _ => panic!("test config must be a mapping"),
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.theme(), "default-theme");
        assert_eq!(config.content_sources(), ["pages"]);
    }

    #[test]
    fn single_content_source() {
        let config = config("theme: modern\ncontent: articles");
        assert_eq!(config.theme(), "modern");
        assert_eq!(config.content_sources(), ["articles"]);
    }

    #[test]
    fn multiple_content_sources() {
        let config = config("content: [pages, posts]");
        assert_eq!(config.content_sources(), ["pages", "posts"]);
    }

    #[test]
    fn missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.theme(), "default-theme");
        assert!(config.raw().is_empty());
    }
}
