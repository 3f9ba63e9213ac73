//! Placeholder tokens in HTML sources.
//!
//! Two syntaxes are recognised, with optional whitespace inside the
//! delimiters:
//!
//! | Token | Name |
//! |-------|------|
//! | `[[title]]` | `title` |
//! | `{{ hero.image }}` | `hero.image` |
//!
//! A token inside an `href` or `src` attribute value is a link
//! placeholder: it is usually filled with a link to another file of the
//! site rather than with text.

use regex::{Captures, Regex};
use std::ops::Range;

use crate::markup::link_value_ranges;
use std::sync::LazyLock;

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[\[\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\]\]|\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Text,
    Link,
}

/// One token in a source, with its byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub name: String,
    pub range: Range<usize>,
    pub kind: PlaceholderKind,
}

/// Unique placeholder names in order of first appearance
pub fn scan(html: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in RE_TOKEN.captures_iter(html) {
        let name = token_name(&caps);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub fn occurrences(html: &str) -> Vec<Occurrence> {
    let link_values = link_value_ranges(html);

    RE_TOKEN
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let range = whole.range();
            let kind = if link_values
                .iter()
                .any(|v| v.start <= range.start && range.end <= v.end)
            {
                PlaceholderKind::Link
            } else {
                PlaceholderKind::Text
            };
            Some(Occurrence {
                name: token_name(&caps).to_string(),
                range,
                kind,
            })
        })
        .collect()
}

/// Names that appear at least once inside an `href`/`src` value
pub fn link_placeholders(html: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for occ in occurrences(html) {
        if occ.kind == PlaceholderKind::Link && !names.contains(&occ.name) {
            names.push(occ.name);
        }
    }
    names
}

/// Replace every token for which `replacement` returns `Some`.
///
/// Tokens for which it returns `None` are kept exactly as written.
pub fn replace_with<F>(html: &str, mut replacement: F) -> String
where
    F: FnMut(&str, PlaceholderKind) -> Option<String>,
{
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for occ in occurrences(html) {
        if let Some(value) = replacement(&occ.name, occ.kind) {
            out.push_str(&html[last..occ.range.start]);
            out.push_str(&value);
            last = occ.range.end;
        }
    }

    out.push_str(&html[last..]);
    out
}

fn token_name<'h>(caps: &Captures<'h>) -> &'h str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default()
}
