//! OpenAI chat completions client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clients::traits::{ProviderRequest, ScriptProvider};
use crate::clients::{ensure_success, send_error};
use crate::config::Config;
use crate::error::{Result, TubeGeniusError};
use crate::schemas::ProviderKind;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_ms: u64,
}

impl OpenAIClient {
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
            config.openai.model.clone(),
            config.openai.base_url.clone(),
            config.runtime.request_timeout_ms,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, request: &'a ProviderRequest, structured: bool) -> ChatRequest<'a> {
        // JSON mode has no schema slot, so structured calls carry the example in the system role
        let system = if structured {
            request
                .instruction_with_example
                .as_deref()
                .or(request.system_instruction.as_deref())
        } else {
            request.system_instruction.as_deref()
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(content) = system {
            messages.push(ChatMessage {
                role: "system",
                content,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_text,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            response_format: structured.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    async fn chat(&self, request: &ProviderRequest, structured: bool) -> Result<Option<String>> {
        let body = self.build_request(request, structured);

        debug!(
            "Calling OpenAI (model={}, structured={}, chars={})",
            self.model,
            structured,
            request.user_text.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::OpenAi, e, self.timeout_ms))?;
        let response = ensure_success(ProviderKind::OpenAi, response).await?;

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            TubeGeniusError::parse(format!("Failed to parse OpenAI response: {}", e))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty()))
    }
}

#[async_trait]
impl ScriptProvider for OpenAIClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete_structured(&self, request: &ProviderRequest) -> Result<String> {
        self.chat(request, true)
            .await?
            .ok_or_else(|| TubeGeniusError::provider("openai", "No response from OpenAI"))
    }

    async fn complete_text(&self, request: &ProviderRequest) -> Result<Option<String>> {
        self.chat(request, false).await
    }
}
