//! Optional generative-AI helpers: filename suggestions and HTML audits.
//!
//! Everything here is advisory. Nothing is applied to a site unless the
//! caller decides to, and a failure for one file never affects another.

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;

pub use gemini::GeminiClient;
pub use sitepack_core::Finding as AuditFinding;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("No API key configured. Run 'sitepack ai configure' or set SITEPACK_API_KEY")]
    MissingApiKey,

    #[error("The API key was rejected by the service")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from the model: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, AssistantError>;

/// A proposed target name for a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameSuggestion {
    pub filename: String,
    pub reason: Option<String>,
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Propose a descriptive `.html` filename for the page at `path`
    async fn suggest_filename(&self, path: &str, html: &str) -> Result<FilenameSuggestion>;

    /// Review the markup of the page at `path`
    async fn audit(&self, path: &str, html: &str) -> Result<Vec<AuditFinding>>;
}

/// Ask for a filename for every `(path, html)` page at once.
/// Results come back in input order, one per page.
pub async fn suggest_all<A>(
    assistant: &A,
    pages: &[(String, String)],
) -> Vec<(String, Result<FilenameSuggestion>)>
where
    A: Assistant + ?Sized,
{
    let requests = pages.iter().map(|(path, html)| async move {
        let result = assistant.suggest_filename(path, html).await;
        if let Err(e) = &result {
            tracing::warn!(page = path.as_str(), error = %e, "filename suggestion failed");
        }
        (path.clone(), result)
    });
    join_all(requests).await
}

/// Audit every `(path, html)` page at once, results in input order
pub async fn audit_all<A>(
    assistant: &A,
    pages: &[(String, String)],
) -> Vec<(String, Result<Vec<AuditFinding>>)>
where
    A: Assistant + ?Sized,
{
    let requests = pages.iter().map(|(path, html)| async move {
        let result = assistant.audit(path, html).await;
        if let Err(e) = &result {
            tracing::warn!(page = path.as_str(), error = %e, "audit failed");
        }
        (path.clone(), result)
    });
    join_all(requests).await
}

/// Lowercase URL-safe slug: ASCII alphanumerics joined by single dashes
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' || c == '.' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Turn a proposed name into a usable `.html` target name.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let lower = name.to_ascii_lowercase();
    let stem = if lower.ends_with(".html") {
        &name[..name.len() - 5]
    } else if lower.ends_with(".htm") {
        &name[..name.len() - 4]
    } else {
        name
    };

    let slug = slugify(stem);
    if slug.is_empty() {
        None
    } else {
        Some(format!("{}.html", slug))
    }
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

/// Suggest a filename without calling any service: the page title, else
/// its first `<h1>`, else its current name. `index.html` stays as is.
pub fn suggest_local(path: &str, html: &str) -> FilenameSuggestion {
    let current = sitepack_core::file_name(path);
    if current.eq_ignore_ascii_case(sitepack_core::INDEX_FILE) {
        return FilenameSuggestion {
            filename: sitepack_core::INDEX_FILE.to_string(),
            reason: Some("directory index".to_string()),
        };
    }

    let document = Html::parse_document(html);
    let text_of = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .map(|e| e.text().collect::<String>())
            .and_then(|t| sanitize_filename(&t))
    };

    if let Some(filename) = text_of(&TITLE) {
        return FilenameSuggestion {
            filename,
            reason: Some("from <title>".to_string()),
        };
    }
    if let Some(filename) = text_of(&H1) {
        return FilenameSuggestion {
            filename,
            reason: Some("from first <h1>".to_string()),
        };
    }

    FilenameSuggestion {
        filename: sanitize_filename(current).unwrap_or_else(|| current.to_string()),
        reason: None,
    }
}
