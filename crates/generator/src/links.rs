//! Relative link resolution and rewriting.
//!
//! Links are found with a DOM parser, then rewritten in the raw source so
//! every byte that is not a rewritten link value stays as the author
//! wrote it. Only `href`/`src` attributes of real start tags are touched;
//! text, comments and script or style bodies are left alone.
//!
//! | Link | Handling |
//! |------|----------|
//! | `about.html`, `../css/a.css` | resolved against the page, rewritten if the target moved |
//! | `blog/` | resolved to `blog/index.html` |
//! | `#top` | kept |
//! | `/about.html`, `//cdn.example.com/x.js` | kept (root-relative) |
//! | `https://…`, `mailto:…`, `data:…` | kept (has a scheme) |

use scraper::{Html, Selector};
use sitepack_core::markup::{Attribute, attributes};
use sitepack_core::{INDEX_FILE, parent_dir};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

const SITE_HOST: &str = "site.invalid";
const SITE_BASE: &str = "http://site.invalid/";

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[href], [src]").unwrap());

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// A relative link resolved to a site path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Site-relative path of the linked file
    pub path: String,
    /// Query and fragment, including their `?`/`#`
    pub suffix: String,
}

/// Whether `href` is relative to the page that contains it
pub fn is_relative_link(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href.starts_with('#')
        || href.starts_with('/')
        || href.starts_with('\\')
        || Url::parse(href).is_ok())
}

/// Resolve `href`, found in the page at site path `from`, to a site path
pub fn resolve_link(from: &str, href: &str) -> Option<ResolvedLink> {
    if !is_relative_link(href) {
        return None;
    }

    let base = Url::parse(SITE_BASE).ok()?.join(&encode_path(from)).ok()?;
    let url = base.join(href.trim()).ok()?;
    if url.host_str() != Some(SITE_HOST) {
        return None;
    }

    let decoded = urlencoding::decode(url.path()).ok()?;
    let mut path = decoded.trim_start_matches('/').to_string();
    if path.is_empty() || path.ends_with('/') {
        path.push_str(INDEX_FILE);
    }

    let mut suffix = String::new();
    if let Some(query) = url.query() {
        suffix.push('?');
        suffix.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        suffix.push('#');
        suffix.push_str(fragment);
    }

    Some(ResolvedLink { path, suffix })
}

/// URL that leads from the file at site path `from` to the file at `to`.
///
/// # Examples
///
/// | from | to | result |
/// |------|----|--------|
/// | `index.html` | `about.html` | `about.html` |
/// | `blog/post.html` | `css/site.css` | `../css/site.css` |
/// | `index.html` | `blog/my post.html` | `blog/my%20post.html` |
pub fn relative_url(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = parent_dir(from).split('/').filter(|s| !s.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();
    let to_dir = &to_parts[..to_parts.len().saturating_sub(1)];

    let common = from_dir
        .iter()
        .zip(to_dir)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from_dir.len() - common];
    parts.extend(
        to_parts[common..]
            .iter()
            .map(|s| urlencoding::encode(s).into_owned()),
    );
    parts.join("/")
}

/// Every distinct `href`/`src` value in the document
pub fn link_values(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut values: Vec<String> = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        for attr in ["href", "src"] {
            if let Some(value) = element.value().attr(attr)
                && !values.iter().any(|v| v == value)
            {
                values.push(value.to_string());
            }
        }
    }

    values
}

/// Rewrite relative links of a page whose files may have moved.
///
/// * `from` - site path the page had in the uploaded folder
/// * `exported_from` - path the page gets in the export
/// * `final_path` - maps a site path to its export path, `None` for
///   anything that is not a file of the site
///
/// Links that still reach the right file from the new location are left
/// untouched, as are links to files outside the site.
pub fn rewrite_links<F>(html: &str, from: &str, exported_from: &str, final_path: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut rewrites: HashMap<String, String> = HashMap::new();

    for value in link_values(html) {
        let Some(link) = resolve_link(from, &value) else {
            continue;
        };
        let Some(target) = final_path(&link.path) else {
            continue;
        };

        let still_valid = !escapes_root(exported_from, &value)
            && resolve_link(exported_from, &value)
                .map(|l| l.path == target)
                .unwrap_or(false);
        if still_valid {
            continue;
        }

        let new_value = format!("{}{}", relative_url(exported_from, &target), link.suffix);
        tracing::debug!(page = from, old = value.as_str(), new = new_value.as_str(), "rewriting link");
        rewrites.insert(value, new_value);
    }

    if rewrites.is_empty() {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for attr in attributes(html).into_iter().filter(Attribute::is_link) {
        let raw = &html[attr.value.clone()];
        let key = decode_attr_value(raw);
        let Some(new_value) = rewrites.get(&*key) else {
            continue;
        };

        out.push_str(&html[last..attr.value.start]);
        if raw.contains('&') {
            out.push_str(&new_value.replace('&', "&amp;"));
        } else {
            out.push_str(new_value);
        }
        last = attr.value.end;
    }
    out.push_str(&html[last..]);
    out
}

/// Attribute value as the DOM reports it, with character references decoded
fn decode_attr_value(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let quote = if raw.contains('"') { '\'' } else { '"' };
    let fragment = Html::parse_fragment(&format!("<a href={quote}{raw}{quote}></a>"));
    fragment
        .select(&ANCHOR_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|value| Cow::Owned(value.to_string()))
        .unwrap_or(Cow::Borrowed(raw))
}

/// Whether `href` climbs above the site root when followed from `from`.
///
/// Browsers clamp such links at the root, but they break as soon as the
/// site is served from a sub-path or opened from disk.
fn escapes_root(from: &str, href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let mut depth = parent_dir(from).split('/').filter(|s| !s.is_empty()).count();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." if depth == 0 => return true,
            ".." => depth -= 1,
            _ => depth += 1,
        }
    }
    false
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
