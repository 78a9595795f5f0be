//! Conversions from parsed YAML into the JSON-like values handed to the
//! template engine. Object key order is preserved end to end so that merge
//! precedence (globals < header < computed fields) stays observable.

use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;

/// Converts a YAML value into a JSON value. YAML mapping keys that are not
/// strings are stringified; YAML tags are stripped.
pub fn yaml_to_json(value: &Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Json::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s.clone()),
        Yaml::Sequence(seq) => Json::Array(seq.iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            let mut object = Map::with_capacity(map.len());
            for (key, value) in map {
                object.insert(key_string(key), yaml_to_json(value));
            }

            Json::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

/// The string form of a YAML mapping key.
pub fn key_string(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".into(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
