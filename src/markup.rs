//! Markup preparation applied before the engine sees the document.
//!
//! Applies the [`RenderOptions`]: optional HTML5 normalisation, the fallback
//! font rule, and the network lock-down when remote resources are disabled.

use crate::RenderOptions;
use log::{debug, warn};
use scraper::{Html, Selector};
use url::Url;

/// Schemes that never leave the process
const LOCAL_SCHEMES: &[&str] = &["data", "about", "blob"];

/// Content-Security-Policy injected when remote resources are disabled.
/// Inline styles and `data:` payloads stay usable; nothing may be fetched.
const OFFLINE_CSP: &str =
    "default-src 'none'; style-src 'unsafe-inline' data:; img-src data:; font-src data:; media-src data:";

/// Markup ready to be loaded into the engine
#[derive(Debug, Clone)]
pub struct PreparedMarkup {
    pub html: String,
    /// Absolute references to resources outside the document
    pub remote_refs: Vec<Url>,
}

/// Apply `options` to `html`.
pub fn prepare(html: &str, options: &RenderOptions) -> PreparedMarkup {
    let parsed = Html::parse_document(html);
    for err in &parsed.errors {
        debug!("html5 parse: {}", err);
    }

    let remote_refs = remote_references(&parsed);

    let mut out = if options.html5_parser {
        format!("<!DOCTYPE html>\n{}", parsed.root_element().html())
    } else {
        html.to_string()
    };

    let mut head = String::new();
    if !options.allow_remote_resources {
        if !remote_refs.is_empty() {
            warn!(
                "blocking {} remote resource reference(s); remote loading is disabled",
                remote_refs.len()
            );
            for r in &remote_refs {
                debug!("blocked reference: {}", r);
            }
        }
        head.push_str(&format!(
            "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">",
            OFFLINE_CSP
        ));
    }
    if let Some(rule) = default_font_rule(&options.default_font) {
        head.push_str(&rule);
    }
    if !head.is_empty() {
        out = inject_into_head(&out, &head);
    }

    PreparedMarkup { html: out, remote_refs }
}

/// A lowest-precedence `font-family` rule, placed ahead of author styles.
fn default_font_rule(font: &str) -> Option<String> {
    let font = font.trim();
    if font.is_empty() {
        return None;
    }
    let quoted: String = font
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\n' | '\r'))
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    Some(format!("<style>html {{ font-family: \"{}\"; }}</style>", quoted))
}

/// Insert `snippet` right after the opening `<head>` tag, or at the start of
/// the document after any doctype when there is none.
fn inject_into_head(html: &str, snippet: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut search = 0;
    while let Some(found) = lower[search..].find("<head") {
        let start = search + found;
        let after = start + "<head".len();
        match lower[after..].chars().next() {
            Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/') => {
                if let Some(close) = lower[after..].find('>') {
                    let at = after + close + 1;
                    return [&html[..at], snippet, &html[at..]].concat();
                }
                break;
            }
            _ => search = after,
        }
    }

    let at = if lower.trim_start().starts_with("<!doctype") {
        lower.find('>').map(|i| i + 1).unwrap_or(0)
    } else {
        0
    };
    [&html[..at], snippet, &html[at..]].concat()
}

/// Collect absolute, non-local resource references from a parsed document.
pub fn remote_references(doc: &Html) -> Vec<Url> {
    let mut refs = Vec::new();
    let all = Selector::parse("*").expect("static selector");

    for el in doc.select(&all) {
        let v = el.value();
        let tag = v.name();

        let attrs: &[&str] = match tag {
            "link" => &["href"],
            "img" => &["src", "srcset"],
            "source" => &["src", "srcset"],
            "script" | "iframe" | "embed" | "audio" | "track" | "input" | "frame" => &["src"],
            "video" => &["src", "poster"],
            "object" => &["data"],
            _ => &[],
        };
        for attr in attrs {
            if let Some(value) = v.attr(attr) {
                if *attr == "srcset" {
                    for candidate in value.split(',') {
                        if let Some(u) = candidate.split_whitespace().next() {
                            push_remote(&mut refs, u);
                        }
                    }
                } else {
                    push_remote(&mut refs, value);
                }
            }
        }

        if let Some(style) = v.attr("style") {
            for u in css_references(style) {
                push_remote(&mut refs, &u);
            }
        }
        if tag == "style" {
            let css: String = el.text().collect();
            for u in css_references(&css) {
                push_remote(&mut refs, &u);
            }
        }
    }
    refs
}

fn push_remote(refs: &mut Vec<Url>, raw: &str) {
    if let Some(u) = classify_remote(raw) {
        if !refs.contains(&u) {
            refs.push(u);
        }
    }
}

/// `Some(url)` when `raw` points outside the document. Relative references
/// have no base to resolve against and are treated as local.
pub fn classify_remote(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let parsed = if raw.starts_with("//") {
        Url::parse(&format!("https:{}", raw))
    } else {
        Url::parse(raw)
    };
    match parsed {
        Ok(u) if !is_local_scheme(u.scheme()) => Some(u),
        _ => None,
    }
}

pub fn is_local_scheme(scheme: &str) -> bool {
    LOCAL_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme))
}

/// Targets of `url(...)` and `@import "..."` in a stylesheet fragment.
pub fn css_references(css: &str) -> Vec<String> {
    let mut out = Vec::new();
    let lower = css.to_ascii_lowercase();

    let mut rest = 0;
    while let Some(i) = lower[rest..].find("url(") {
        let start = rest + i + "url(".len();
        let Some(len) = css[start..].find(')') else { break };
        let target = css[start..start + len]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        if !target.is_empty() {
            out.push(target.to_string());
        }
        rest = start + len;
    }

    let mut rest = 0;
    while let Some(i) = lower[rest..].find("@import") {
        let start = rest + i + "@import".len();
        let tail = css[start..].trim_start();
        if let Some(q) = tail.chars().next().filter(|c| *c == '"' || *c == '\'') {
            if let Some(end) = tail[1..].find(q) {
                out.push(tail[1..1 + end].to_string());
            }
        }
        rest = start;
    }
    out
}
