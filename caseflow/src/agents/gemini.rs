//! Model client for the Generative Language `generateContent` endpoint.

use super::ModelClient;
use crate::errors::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const MAX_ERROR_BODY: usize = 512;

/// A [`ModelClient`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client against the public endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root (proxies, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured API root.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model_id)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Joins the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, ModelError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::Request(format!("Failed to parse response: {e}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn call(&self, model_id: &str, instruction: &str) -> Result<String, ModelError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: instruction }],
            }],
        };

        debug!(model = model_id, chars = instruction.len(), "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ModelError::Status {
                status,
                body: truncate(&body_text),
            });
        }

        extract_text(&body_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let err = extract_text(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
    }

    #[test]
    fn test_extract_text_invalid_json() {
        let err = extract_text("not json").unwrap_err();
        assert!(matches!(err, ModelError::Request(_)));
    }

    #[test]
    fn test_endpoint_and_base_url() {
        let client = GeminiClient::new("key").with_base_url("http://localhost:9999/");
        assert_eq!(client.base_url(), "http://localhost:9999");
        assert_eq!(
            client.endpoint("gemini-2.0-flash"),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY + 10);
        let short = truncate(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.len(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate("short"), "short");
    }
}
