// Google Gemini `generateContent` client

use crate::{Assistant, AssistantError, AuditFinding, FilenameSuggestion, Result, prompt};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sitepack_core::Severity;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

/// Gemini API response wrapper
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    filename: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    #[serde(default)]
    severity: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuditPayload {
    Wrapped { findings: Vec<RawFinding> },
    Bare(Vec<RawFinding>),
}

impl GeminiClient {
    /// Client for the default model and endpoint
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_options(api_key, DEFAULT_MODEL, DEFAULT_ENDPOINT)
    }

    pub fn with_options(api_key: &str, model: &str, endpoint: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AssistantError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(api_key).map_err(|_| AssistantError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and return the text of the first candidate
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };

        tracing::debug!(model = self.model.as_str(), chars = prompt.len(), "sending prompt");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AssistantError::MalformedResponse("no text in response".to_string()))
    }
}

#[async_trait]
impl Assistant for GeminiClient {
    async fn suggest_filename(&self, path: &str, html: &str) -> Result<FilenameSuggestion> {
        let text = self.generate(&prompt::filename_prompt(path, html)).await?;
        let raw: RawSuggestion = parse_json(&text)?;

        let filename = crate::sanitize_filename(&raw.filename).ok_or_else(|| {
            AssistantError::MalformedResponse(format!("unusable filename '{}'", raw.filename))
        })?;

        Ok(FilenameSuggestion {
            filename,
            reason: raw.reason.filter(|r| !r.trim().is_empty()),
        })
    }

    async fn audit(&self, path: &str, html: &str) -> Result<Vec<AuditFinding>> {
        let text = self.generate(&prompt::audit_prompt(path, html)).await?;
        let raw = match parse_json::<AuditPayload>(&text)? {
            AuditPayload::Wrapped { findings } => findings,
            AuditPayload::Bare(findings) => findings,
        };

        let mut findings: Vec<AuditFinding> = raw
            .into_iter()
            .filter(|f| !f.message.trim().is_empty())
            .map(|f| AuditFinding::new(parse_severity(&f.severity), f.message.trim()))
            .collect();
        findings.sort_by_key(|f| f.severity);
        Ok(findings)
    }
}

fn error_for_status(status: StatusCode, body: &str) -> AssistantError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let key_rejected = body.contains("API_KEY_INVALID")
        || envelope
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .is_some_and(|s| s == "UNAUTHENTICATED" || s == "PERMISSION_DENIED");

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || (status == StatusCode::BAD_REQUEST && key_rejected)
    {
        return AssistantError::InvalidApiKey;
    }

    let message = envelope
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string());
    AssistantError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Models like to wrap JSON in Markdown fences even when asked not to
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json)
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        // One-line reply: the info string runs up to the JSON itself
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| AssistantError::MalformedResponse(e.to_string()))
}

fn parse_severity(s: &str) -> Severity {
    match s.trim().to_ascii_lowercase().as_str() {
        "error" | "critical" | "high" => Severity::Error,
        "warning" | "warn" | "medium" => Severity::Warning,
        _ => Severity::Info,
    }
}
