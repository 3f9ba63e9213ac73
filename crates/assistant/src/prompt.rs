use std::borrow::Cow;

/// Most characters of page markup sent along with a prompt
pub const MAX_HTML_CHARS: usize = 30_000;

/// Cut `html` to at most [`MAX_HTML_CHARS`] characters
pub fn truncate_html(html: &str) -> Cow<'_, str> {
    match html.char_indices().nth(MAX_HTML_CHARS) {
        Some((end, _)) => Cow::Owned(format!("{}\n<!-- truncated -->", &html[..end])),
        None => Cow::Borrowed(html),
    }
}

pub fn filename_prompt(path: &str, html: &str) -> String {
    format!(
        r#"You name pages of a static website. Suggest a short, descriptive,
lowercase filename for the page below, using only a-z, 0-9 and dashes,
ending in ".html". Answer with JSON only, no prose:
{{"filename": "example-page.html", "reason": "one short sentence"}}

Current path: {path}

{html}"#,
        path = path,
        html = truncate_html(html)
    )
}

pub fn audit_prompt(path: &str, html: &str) -> String {
    format!(
        r#"You review HTML pages of a static website for accessibility, SEO and
markup problems. List concrete issues in the page below. Answer with JSON
only, no prose:
{{"findings": [{{"severity": "error|warning|info", "message": "..."}}]}}
Use an empty list when the page has no issues.

Path: {path}

{html}"#,
        path = path,
        html = truncate_html(html)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_html_short_input_is_borrowed() {
        assert!(matches!(truncate_html("<p>hi</p>"), Cow::Borrowed("<p>hi</p>")));
    }

    #[test]
    fn test_truncate_html_on_char_boundary() {
        let html = "é".repeat(MAX_HTML_CHARS + 10);
        let truncated = truncate_html(&html);
        assert!(truncated.starts_with(&"é".repeat(MAX_HTML_CHARS)));
        assert!(truncated.ends_with("<!-- truncated -->"));
        assert_eq!(truncated.chars().filter(|&c| c == 'é').count(), MAX_HTML_CHARS);
    }

    #[test]
    fn test_prompts_embed_path_and_html() {
        let prompt = filename_prompt("blog/p1.html", "<h1>Hello</h1>");
        assert!(prompt.contains("blog/p1.html"));
        assert!(prompt.contains("<h1>Hello</h1>"));
        assert!(prompt.contains(r#"{"filename""#));

        let prompt = audit_prompt("a.html", "<p>x</p>");
        assert!(prompt.contains(r#"{"findings": ["#));
    }
}
