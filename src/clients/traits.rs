use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::schemas::ProviderKind;

/// One call to a hosted model
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub system_instruction: Option<String>,
    pub user_text: String,
    /// Shape the reply must follow; `None` for free text
    pub response_schema: Option<Value>,
    /// System instruction variant for providers that only support a
    /// generic JSON mode: carries an example of the expected object.
    pub instruction_with_example: Option<String>,
    pub temperature: f32,
}

impl ProviderRequest {
    pub fn new(user_text: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            user_text: user_text.into(),
            response_schema: None,
            instruction_with_example: None,
            temperature: 0.7,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_schema(mut self, schema: Value, instruction_with_example: impl Into<String>) -> Self {
        self.response_schema = Some(schema);
        self.instruction_with_example = Some(instruction_with_example.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A hosted generative-text backend.
///
/// Implementations differ in wire format only: for the same structured
/// request every backend must return JSON with the same field names.
#[async_trait]
pub trait ScriptProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Raw JSON text for a request carrying a response schema.
    async fn complete_structured(&self, request: &ProviderRequest) -> Result<String>;

    /// Free text, or `None` when the model produced nothing.
    async fn complete_text(&self, request: &ProviderRequest) -> Result<Option<String>>;
}
