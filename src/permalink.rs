//! Permalink derivation and the permalink → output file path mapping.
//!
//! A permalink is a normalized absolute URL path: it always starts with `/`.
//! It is either taken from the page's front matter (and normalized) or
//! derived from the page's content-source-relative path.

use std::path::PathBuf;

use serde_yaml::{Mapping, Value as Yaml};

/// Resolves the permalink for a page. `page_key` is the page's relative path
/// under its content source, `/`-separated, extension stripped. A `permalink`
/// header value wins; otherwise the key derives the link: `index` → `/`,
/// `a/index` → `/a/`, `a/b` → `/a/b.html`.
pub fn resolve(page_key: &str, header: &Mapping) -> String {
    if let Some(permalink) = header.get("permalink").and_then(Yaml::as_str) {
        return normalize(permalink);
    }

    if page_key == "index" {
        return "/".into();
    }

    match page_key.strip_suffix("index") {
        Some(prefix) if prefix.ends_with('/') => format!("/{prefix}"),
        _ => format!("/{page_key}.html"),
    }
}

/// Normalizes a header-supplied permalink: ensures the leading `/` and, for
/// links that are neither `.html` files nor directory paths, a trailing `/`.
fn normalize(permalink: &str) -> String {
    let mut link = match permalink.starts_with('/') {
        true => permalink.to_string(),
        false => format!("/{permalink}"),
    };

    if !link.ends_with(".html") && !link.ends_with('/') {
        link.push('/');
    }

    link
}

/// The output file path for a permalink, relative to the output directory.
/// `/` and any `…/` path land at `…/index.html`.
pub fn output_path(permalink: &str) -> PathBuf {
    let mut file = permalink.trim_start_matches('/').to_string();
    if file.is_empty() || file.ends_with('/') {
        file.push_str("index.html");
    }

    file.split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn derived_from_page_key() {
        let empty = Mapping::new();
        assert_eq!(resolve("index", &empty), "/");
        assert_eq!(resolve("a/index", &empty), "/a/");
        assert_eq!(resolve("a/b", &empty), "/a/b.html");
        assert_eq!(resolve("deeply/nested/page", &empty), "/deeply/nested/page.html");
    }

    #[test]
    fn index_is_only_special_as_full_component() {
        let empty = Mapping::new();
        assert_eq!(resolve("reindex", &empty), "/reindex.html");
        assert_eq!(resolve("a/reindex", &empty), "/a/reindex.html");
    }

    #[test]
    fn header_permalink_gets_trailing_slash() {
        assert_eq!(resolve("a/b", &header("permalink: foo")), "/foo/");
        assert_eq!(resolve("a/b", &header("permalink: /foo/bar")), "/foo/bar/");
    }

    #[test]
    fn header_permalink_html_kept_verbatim() {
        assert_eq!(resolve("a/b", &header("permalink: foo.html")), "/foo.html");
        assert_eq!(resolve("a/b", &header("permalink: /foo.html")), "/foo.html");
    }

    #[test]
    fn header_permalink_root() {
        assert_eq!(resolve("a/b", &header("permalink: /")), "/");
    }

    #[test]
    fn non_string_header_permalink_is_ignored() {
        assert_eq!(resolve("a/b", &header("permalink: 3")), "/a/b.html");
    }

    #[test]
    fn always_absolute() {
        for key in ["index", "a/index", "a/b", "x"] {
            assert!(resolve(key, &Mapping::new()).starts_with('/'));
        }
    }

    #[test]
    fn output_paths() {
        assert_eq!(output_path("/"), PathBuf::from("index.html"));
        assert_eq!(output_path("/a/"), PathBuf::from("a/index.html"));
        assert_eq!(output_path("/a/b.html"), PathBuf::from("a/b.html"));
    }
}
