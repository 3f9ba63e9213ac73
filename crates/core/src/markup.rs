//! Attribute positions in raw HTML source.
//!
//! A small tokenizer that only follows what a browser treats as markup:
//! comments, doctypes and end tags are skipped, and the bodies of raw-text
//! elements such as `<script>` and `<style>` are never read as tags. Text
//! that merely looks like an attribute (`&lt;a href="x"&gt;`, `img.src = "x"`)
//! is therefore never reported.

use std::ops::Range;

/// Elements whose content is text up to the matching end tag
const RAW_TEXT: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes",
];

/// An attribute value inside a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name
    pub name: String,
    /// Byte range of the value, without quotes
    pub value: Range<usize>,
    /// Quote around the value, `None` for unquoted values
    pub quote: Option<char>,
}

impl Attribute {
    /// Whether this is an `href` or `src` attribute
    pub fn is_link(&self) -> bool {
        self.name == "href" || self.name == "src"
    }
}

/// Every attribute with a value in the start tags of `html`, in source order
pub fn attributes(html: &str) -> Vec<Attribute> {
    let bytes = html.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while let Some(offset) = html[i..].find('<') {
        let start = i + offset;
        let rest = &html[start..];

        i = if rest.starts_with("<!--") {
            html[start + 4..]
                .find("-->")
                .map_or(html.len(), |end| start + 4 + end + 3)
        } else if rest.starts_with("<!") || rest.starts_with("<?") || rest.starts_with("</") {
            rest.find('>').map_or(html.len(), |end| start + end + 1)
        } else if bytes.get(start + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            let (tag, end) = start_tag(html, start + 1, &mut attrs);
            if RAW_TEXT.contains(&tag.as_str()) {
                skip_raw_text(html, end, &tag)
            } else {
                end
            }
        } else {
            start + 1
        };
    }

    attrs
}

/// Byte ranges of every `href`/`src` value
pub fn link_value_ranges(html: &str) -> Vec<Range<usize>> {
    attributes(html)
        .into_iter()
        .filter(Attribute::is_link)
        .map(|attr| attr.value)
        .collect()
}

/// Read the start tag whose name begins at `i`. Returns the lowercased tag
/// name and the offset just past the tag.
fn start_tag(html: &str, mut i: usize, attrs: &mut Vec<Attribute>) -> (String, usize) {
    let bytes = html.as_bytes();
    let len = bytes.len();

    let name_start = i;
    while i < len && !is_space(bytes[i]) && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let tag = html[name_start..i].to_ascii_lowercase();

    loop {
        while i < len && (is_space(bytes[i]) || bytes[i] == b'/') {
            i += 1;
        }
        if i >= len {
            return (tag, len);
        }
        if bytes[i] == b'>' {
            return (tag, i + 1);
        }

        let name_start = i;
        if bytes[i] == b'=' {
            i += 1;
        }
        while i < len && !is_space(bytes[i]) && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let name = html[name_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < len && is_space(bytes[j]) {
            j += 1;
        }
        if j >= len || bytes[j] != b'=' {
            // Attribute without a value
            i = j;
            continue;
        }
        j += 1;
        while j < len && is_space(bytes[j]) {
            j += 1;
        }
        if j >= len {
            return (tag, len);
        }

        match bytes[j] {
            quote @ (b'"' | b'\'') => {
                let value_start = j + 1;
                let value_end = html[value_start..]
                    .find(quote as char)
                    .map_or(len, |end| value_start + end);
                attrs.push(Attribute {
                    name,
                    value: value_start..value_end,
                    quote: Some(quote as char),
                });
                i = (value_end + 1).min(len);
            }
            b'>' => return (tag, j + 1),
            _ => {
                let value_start = j;
                while j < len && !is_space(bytes[j]) && bytes[j] != b'>' {
                    j += 1;
                }
                attrs.push(Attribute {
                    name,
                    value: value_start..j,
                    quote: None,
                });
                i = j;
            }
        }
    }
}

/// Offset of the end tag closing a raw-text element opened before `from`
fn skip_raw_text(html: &str, from: usize, tag: &str) -> usize {
    let close = format!("</{}", tag);
    html[from..]
        .to_ascii_lowercase()
        .find(&close)
        .map_or(html.len(), |end| from + end)
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}
