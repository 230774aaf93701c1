//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::AiError;
use super::{ChatRole, CompletionRequest, LanguageModel};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// Keep error bodies short; they end up in the UI
const MAX_ERROR_BODY: usize = 300;

#[derive(Clone, Debug, PartialEq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

// Wire types for the request body
#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
    role: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

// Wire types for the response body
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Build the JSON body. The system prompt is sent as the leading part of the
/// first user turn.
pub fn build_request_body(request: &CompletionRequest, temperature: f32, max_output_tokens: u32) -> serde_json::Value {
    let mut contents: Vec<Content> = Vec::with_capacity(request.turns.len().max(1));
    let mut system_pending = !request.system.is_empty();
    for (role, text) in &request.turns {
        let mut parts = Vec::with_capacity(2);
        if system_pending && *role == ChatRole::User {
            parts.push(Part { text: request.system.as_str() });
            system_pending = false;
        }
        parts.push(Part { text: text.as_str() });
        contents.push(Content { parts, role: role.as_str() });
    }
    if system_pending {
        contents.insert(0, Content { parts: vec![Part { text: request.system.as_str() }], role: ChatRole::User.as_str() });
    }
    let body = GenerateRequest {
        contents,
        generation_config: GenerationConfig { temperature, max_output_tokens },
    };
    serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
}

// First candidate's first text part is the whole answer
pub fn extract_text(response: GenerateResponse) -> Result<String, AiError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(AiError::EmptyResponse)
}

pub fn build_endpoint(base_url: &str, model: &str, api_key: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/{}:generateContent", base_url.trim_end_matches('/'), model))?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

pub fn http_error(status: u16, body: &str) -> AiError {
    let mut body = body.trim().to_string();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    AiError::Http { status, body }
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Url,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }
        let endpoint = build_endpoint(&config.base_url, &config.model, config.api_key.trim())
            .map_err(|e| AiError::Network(format!("invalid endpoint '{}': {}", config.base_url, e)))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout: config.timeout,
        })
    }

    async fn send(&self, body: serde_json::Value) -> Result<String, AiError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            // the URL carries the key; keep it out of messages
            .map_err(|e| AiError::Network(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(http_error(status.as_u16(), &text));
        }
        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Parse(e.without_url().to_string()))?;
        extract_text(parsed)
    }
}

impl LanguageModel for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        let body = build_request_body(request, self.temperature, self.max_output_tokens);
        log::debug!("ai request: {} turn(s), timeout {:?}", request.turns.len(), self.timeout);
        match tokio::time::timeout(self.timeout, self.send(body)).await {
            Ok(Ok(text)) => {
                log::debug!("ai response: {} bytes", text.len());
                Ok(text)
            }
            Ok(Err(e)) => {
                log::warn!("ai request failed ({}): {}", e.code().as_str(), e);
                Err(e)
            }
            Err(_) => {
                log::warn!("ai request timed out after {:?}", self.timeout);
                Err(AiError::Timeout { after: self.timeout })
            }
        }
    }
}
