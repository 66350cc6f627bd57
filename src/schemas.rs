//! Data model shared by the services, the controller and the views

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, TubeGeniusError};

/// One proposed piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestion {
    pub title: String,
    pub description: String,
    pub reasoning: String,
}

/// Tone, audience and topic ideas extracted from the user's script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tone: String,
    #[serde(rename = "targetAudience")]
    pub target_audience: String,
    pub topics: Vec<TopicSuggestion>,
}

/// Number of topics the analysis prompt asks for
pub const REQUESTED_TOPIC_COUNT: usize = 3;

impl AnalysisResult {
    /// Parse provider output into a checked result.
    ///
    /// Accepts the JSON object either bare or wrapped in a markdown code fence.
    pub fn from_json(text: &str) -> Result<Self> {
        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(TubeGeniusError::parse("analysis response was empty"));
        }
        let parsed: AnalysisResult = serde_json::from_str(body).map_err(|e| {
            TubeGeniusError::parse(format!("analysis response does not match schema: {}", e))
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tone.trim().is_empty() {
            return Err(TubeGeniusError::parse("analysis is missing a tone"));
        }
        if self.target_audience.trim().is_empty() {
            return Err(TubeGeniusError::parse("analysis is missing a target audience"));
        }
        if self.topics.is_empty() {
            return Err(TubeGeniusError::parse("analysis returned no topics"));
        }
        for (idx, topic) in self.topics.iter().enumerate() {
            if topic.title.trim().is_empty()
                || topic.description.trim().is_empty()
                || topic.reasoning.trim().is_empty()
            {
                return Err(TubeGeniusError::parse(format!(
                    "topic {} has an empty field",
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Response schema for the analysis call, in the OpenAPI subset Gemini accepts.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tone": {
                "type": "STRING",
                "description": "분석된 텍스트의 톤앤매너 (예: 활기찬, 진지한, 교육적인)"
            },
            "targetAudience": {
                "type": "STRING",
                "description": "예상 타겟 시청자층"
            },
            "topics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": "클릭을 유도하는 매력적인 유튜브 제목"
                        },
                        "description": {
                            "type": "STRING",
                            "description": "영상 내용에 대한 간략한 설명"
                        },
                        "reasoning": {
                            "type": "STRING",
                            "description": "이 주제를 추천하는 전략적 이유"
                        }
                    },
                    "required": ["title", "description", "reasoning"]
                }
            }
        },
        "required": ["tone", "targetAudience", "topics"]
    })
}

/// Where the workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppStep {
    #[default]
    Input,
    Selecting,
    Generating,
    Result,
}

impl fmt::Display for AppStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppStep::Input => "INPUT",
            AppStep::Selecting => "SELECTING",
            AppStep::Generating => "GENERATING",
            AppStep::Result => "RESULT",
        };
        f.write_str(s)
    }
}

/// Hosted model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = TubeGeniusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" | "open-ai" | "gpt" => Ok(ProviderKind::OpenAi),
            other => Err(TubeGeniusError::Config {
                message: format!("unknown provider '{}' (expected gemini or openai)", other),
            }),
        }
    }
}
