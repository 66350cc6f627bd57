//! Google Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::clients::traits::{ProviderRequest, ScriptProvider};
use crate::clients::{ensure_success, send_error};
use crate::config::Config;
use crate::error::{Result, TubeGeniusError};
use crate::schemas::ProviderKind;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_ms: u64,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| TubeGeniusError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url,
            timeout_ms,
        })
    }

    pub fn from_config(api_key: String, config: &Config) -> Result<Self> {
        Self::new(
            api_key,
            config.gemini.model.clone(),
            config.gemini.base_url.clone(),
            config.runtime.request_timeout_ms,
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate(&self, request: &ProviderRequest, structured: bool) -> Result<Option<String>> {
        let schema = if structured {
            request.response_schema.as_ref()
        } else {
            None
        };
        let body = GenerateContentRequest {
            system_instruction: request.system_instruction.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.user_text,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: schema.map(|_| "application/json"),
                response_schema: schema,
            },
        };

        debug!(
            "Calling Gemini (model={}, structured={}, chars={})",
            self.model,
            structured,
            request.user_text.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::Gemini, e, self.timeout_ms))?;
        let response = ensure_success(ProviderKind::Gemini, response).await?;

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            TubeGeniusError::parse(format!("Failed to parse Gemini response: {}", e))
        })?;

        Ok(extract_text(parsed))
    }
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    if let Some(reason) = candidate.finish_reason.as_deref()
        && reason != "STOP"
    {
        debug!("Gemini finished with reason {}", reason);
    }
    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

#[async_trait]
impl ScriptProvider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete_structured(&self, request: &ProviderRequest) -> Result<String> {
        self.generate(request, true)
            .await?
            .ok_or_else(|| TubeGeniusError::provider("gemini", "No response text from Gemini"))
    }

    async fn complete_text(&self, request: &ProviderRequest) -> Result<Option<String>> {
        self.generate(request, false).await
    }
}
