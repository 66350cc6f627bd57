//! Domain-specific error types for tube-genius

use thiserror::Error;

/// User-facing messages shown in the error banner.
pub const MSG_EMPTY_INPUT: &str = "대본이나 아이디어를 입력해주세요.";
pub const MSG_MISSING_CREDENTIAL: &str =
    "API 키가 설정되지 않았습니다. `tube-genius keys set --gemini <KEY>` 또는 `--openai <KEY>`로 키를 하나 이상 등록해주세요.";
pub const MSG_ANALYSIS_FAILED: &str = "분석 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";
pub const MSG_GENERATION_FAILED: &str = "대본 생성 중 오류가 발생했습니다.";

/// Main error type for tube-genius
#[derive(Error, Debug)]
pub enum TubeGeniusError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing credential: {message}")]
    MissingCredential { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TubeGeniusError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        TubeGeniusError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        TubeGeniusError::Parse {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TubeGeniusError {
    fn from(err: serde_json::Error) -> Self {
        TubeGeniusError::Parse {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for TubeGeniusError {
    fn from(err: std::io::Error) -> Self {
        TubeGeniusError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for tube-genius operations
pub type Result<T> = std::result::Result<T, TubeGeniusError>;
