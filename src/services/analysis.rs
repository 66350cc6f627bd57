use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::{ProviderRequest, ScriptProvider};
use crate::error::{Result, TubeGeniusError};
use crate::prompts::{ANALYSIS_INSTRUCTION, analysis_instruction_with_example};
use crate::schemas::{AnalysisResult, REQUESTED_TOPIC_COUNT, analysis_schema};

/// Extracts tone, audience and topic ideas from a script
#[derive(Clone)]
pub struct AnalysisService {
    provider: Arc<dyn ScriptProvider>,
    temperature: f32,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn ScriptProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    pub fn request_for(&self, input: &str) -> ProviderRequest {
        ProviderRequest::new(input)
            .with_system_instruction(ANALYSIS_INSTRUCTION)
            .with_schema(analysis_schema(), analysis_instruction_with_example())
            .with_temperature(self.temperature)
    }

    /// Analyze `input`. Blank input fails before any provider call.
    pub async fn analyze(&self, input: &str) -> Result<AnalysisResult> {
        if input.trim().is_empty() {
            return Err(TubeGeniusError::Validation {
                message: "input text is empty".to_string(),
            });
        }

        let request = self.request_for(input);
        let raw = self.provider.complete_structured(&request).await?;
        debug!(
            "Analysis reply from {} ({} chars)",
            self.provider.kind(),
            raw.chars().count()
        );

        let result = AnalysisResult::from_json(&raw)?;
        if result.topics.len() != REQUESTED_TOPIC_COUNT {
            warn!(
                "Expected {} topics, provider returned {}",
                REQUESTED_TOPIC_COUNT,
                result.topics.len()
            );
        }
        Ok(result)
    }
}
