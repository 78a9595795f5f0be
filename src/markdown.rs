//! Markdown-to-HTML conversion, plus the div-wrapper shorthand.
//!
//! A line `[% .class #id "css: value;" %]` opens a `<div>` carrying those
//! attributes and `[% / %]` closes it. The wrapper runs as a line-level
//! preprocessor before the markdown parser so the emitted tags become raw
//! HTML blocks.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

static DIV_WRAPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[%(?P<attr>[^%]*)%\]").unwrap());

static DIV_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?P<style>[^"]+)"|\.(?P<class>\S+)|#(?P<id>\S+)"#).unwrap());

/// Converts markdown to trimmed HTML.
pub fn convert(markup: &str) -> String {
    let markup = wrap_divs(markup);
    let parser = Parser::new_ext(&markup, Options::ENABLE_TABLES);

    let mut out = String::with_capacity(markup.len() * 2);
    html::push_html(&mut out, parser);
    out.trim().to_string()
}

fn wrap_divs(markup: &str) -> String {
    if !markup.contains("[%") {
        return markup.to_string();
    }

    let mut lines = Vec::new();
    for line in markup.lines() {
        let Some(captures) = DIV_WRAPPER.captures(line) else {
            lines.push(line.to_string());
            continue;
        };

        let attributes = captures["attr"].trim().to_string();
        let tag = match attributes.as_str() {
            "/" => "</div>".to_string(),
            _ => div_tag(&attributes),
        };

        // Blank lines around the tag keep it a standalone HTML block.
        lines.push(String::new());
        lines.push(tag);
        lines.push(String::new());
    }

    lines.join("\n")
}

fn div_tag(attributes: &str) -> String {
    let mut id = None;
    let mut classes = Vec::new();
    let mut styles = Vec::new();

    for capture in DIV_ATTR.captures_iter(attributes) {
        if let Some(m) = capture.name("id") {
            id = Some(m.as_str());
        }

        if let Some(m) = capture.name("class") {
            classes.push(m.as_str());
        }

        if let Some(m) = capture.name("style") {
            styles.push(m.as_str().trim_matches(';').trim());
        }
    }

    let mut tag = String::from("<div");
    if let Some(id) = id {
        tag.push_str(&format!(" id=\"{id}\""));
    }

    if !classes.is_empty() {
        tag.push_str(&format!(" class=\"{}\"", classes.join(" ")));
    }

    if !styles.is_empty() {
        tag.push_str(&format!(" style=\"{};\"", styles.join("; ")));
    }

    tag.push('>');
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_markdown() {
        assert_eq!(convert("# Title"), "<h1>Title</h1>");
    }

    #[test]
    fn tables_enabled() {
        let html = convert("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "no table in: {html}");
    }

    #[test]
    fn div_wrapper_open_and_close() {
        let html = convert("[% .hero #main %]\ntext\n[% / %]");
        assert!(html.contains("<div id=\"main\" class=\"hero\">"), "in: {html}");
        assert!(html.contains("</div>"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn div_wrapper_styles() {
        let html = convert("[% \"color: red;\" \"margin: 0\" %]\nx\n[% / %]");
        assert!(html.contains("<div style=\"color: red; margin: 0;\">"), "in: {html}");
    }

    #[test]
    fn bracket_text_inline_is_untouched() {
        let html = convert("see [% not a wrapper mid-sentence");
        assert!(html.contains("see [% not a wrapper"));
    }
}
