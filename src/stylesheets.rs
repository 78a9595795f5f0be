//! SCSS compilation with configuration-driven variables.
//!
//! Every top-level configuration key is projected into an SCSS variable and
//! prepended to each stylesheet before compilation, so a theme can expose
//! knobs (colors, fonts, spacing) that sites tune from `website.yaml`. The
//! site's `stylesheets` directory precedes the theme's on the import search
//! path. Output style is compressed.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_yaml::Value as Yaml;

use crate::assets::AssetResolver;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::value::key_string;

/// Where compiled stylesheets land under the output directory.
pub const CSS_SUBDIR: &str = "assets/css";

pub struct StylesheetCompiler {
    prelude: String,
    load_paths: Vec<PathBuf>,
}

impl StylesheetCompiler {
    pub fn new(config: &Config, resolver: &AssetResolver) -> StylesheetCompiler {
        StylesheetCompiler {
            prelude: variable_prelude(config),
            load_paths: resolver.dirs("stylesheets", false),
        }
    }

    /// Compiles one stylesheet to compressed CSS with the configuration
    /// variables in scope.
    pub fn compile(&self, name: &str, path: &Path) -> Result<String> {
        let source = std::fs::read_to_string(path)?;
        let options = grass::Options::default()
            .style(grass::OutputStyle::Compressed)
            .load_paths(&self.load_paths);

        grass::from_string(format!("{}{}", self.prelude, source), &options)
            .map_err(|source| Error::Stylesheet { name: name.to_string(), source })
    }
}

/// `$key: value;` declarations for every top-level configuration entry.
fn variable_prelude(config: &Config) -> String {
    let mut prelude = String::new();
    for (key, value) in config.raw() {
        let _ = writeln!(prelude, "${}: {};", key_string(key), scss_value(value));
    }

    prelude
}

/// Projects a YAML value into SCSS syntax. Strings pass through unquoted so
/// `#`-prefixed values stay colors; sequences and mappings become SCSS lists
/// and maps.
fn scss_value(value: &Yaml) -> String {
    match value {
        Yaml::String(s) => s.clone(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Sequence(seq) => {
            let items: Vec<String> = seq.iter().map(scss_value).collect();
            format!("({})", items.join(", "))
        }
        Yaml::Mapping(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", key_string(k), scss_value(v)))
                .collect();
            format!("({})", entries.join(", "))
        }
        Yaml::Tagged(tagged) => scss_value(&tagged.value),
        Yaml::Null => "null".into(),
    }
}
