//! # Gemini Service
//!
//! `generateContent` over REST with a JSON response schema.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GenerationRequest, GenerativeService};
use crate::config::ForgeConfig;
use crate::error::ForgeError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_json_schema: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, thoughts skipped
    fn answer_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn empty_reason(&self) -> String {
        if let Some(feedback) = &self.prompt_feedback {
            return format!("no candidates (prompt feedback: {})", feedback);
        }
        match self.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            Some(reason) => format!("empty candidate (finish reason: {})", reason),
            None => "response contained no text".to_string(),
        }
    }
}

/// Live client for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiService {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiService {
    pub fn new(config: &ForgeConfig) -> Result<Self, ForgeError> {
        let key = HeaderValue::from_str(config.api_key().expose()).map_err(|_| {
            ForgeError::Configuration("API key contains invalid characters".to_string())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ForgeError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeService for GeminiService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ForgeError> {
        let operation = request.operation;
        let body = GenerateContentBody {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: &request.schema,
                thinking_config: request
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        };

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::service(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.unwrap_or_default();
            return Err(ForgeError::service(
                operation,
                format!("HTTP {}: {}", status.as_u16(), description.trim()),
            ));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::schema(operation, format!("undecodable envelope: {}", e)))?;

        payload
            .answer_text()
            .ok_or_else(|| ForgeError::schema(operation, payload.empty_reason()))
    }
}
