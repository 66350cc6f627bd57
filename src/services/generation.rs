use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::{ProviderRequest, ScriptProvider};
use crate::config::DEFAULT_CONTEXT_LIMIT;
use crate::error::Result;
use crate::prompts::build_generation_prompt;
use crate::schemas::TopicSuggestion;

/// Returned in place of an empty generation
pub const GENERATION_FALLBACK: &str = "대본 생성에 실패했습니다. 다시 시도해주세요.";

/// Writes a full script for one topic
#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn ScriptProvider>,
    temperature: f32,
    context_limit: usize,
}

impl GenerationService {
    pub fn new(provider: Arc<dyn ScriptProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub async fn generate(
        &self,
        topic: &TopicSuggestion,
        original_context: &str,
        tone: &str,
    ) -> Result<String> {
        let prompt = build_generation_prompt(topic, tone, original_context, self.context_limit);
        let request = ProviderRequest::new(prompt).with_temperature(self.temperature);

        match self.provider.complete_text(&request).await? {
            Some(script) if !script.trim().is_empty() => {
                debug!(
                    "Generated script for '{}' ({} chars)",
                    topic.title,
                    script.chars().count()
                );
                Ok(script)
            }
            _ => {
                warn!("{} returned no script text, using fallback", self.provider.kind());
                Ok(GENERATION_FALLBACK.to_string())
            }
        }
    }
}
