pub mod fake;
pub mod gemini;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use tracing::info;

pub use fake::FakeProvider;
pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use traits::{ProviderRequest, ScriptProvider};

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{Result, TubeGeniusError};
use crate::schemas::ProviderKind;

const ERROR_BODY_CAP: usize = 500;

/// Build the client for `kind` from the stored credentials.
pub fn create_provider(
    kind: ProviderKind,
    creds: &Credentials,
    config: &Config,
) -> Result<Arc<dyn ScriptProvider>> {
    let key = creds
        .key_for(kind)
        .ok_or_else(|| TubeGeniusError::MissingCredential {
            message: format!("no API key stored for {}", kind),
        })?
        .to_string();

    match kind {
        ProviderKind::Gemini => {
            info!("Using Gemini (model={})", config.gemini.model);
            Ok(Arc::new(GeminiClient::from_config(key, config)?))
        }
        ProviderKind::OpenAi => {
            info!("Using OpenAI (model={})", config.openai.model);
            Ok(Arc::new(OpenAIClient::from_config(key, config)?))
        }
    }
}

/// Pick a provider by credential availability and build it.
pub fn select_provider(
    creds: &Credentials,
    config: &Config,
    preferred: Option<ProviderKind>,
) -> Result<Arc<dyn ScriptProvider>> {
    let preferred = preferred.or(config.runtime.provider);
    let kind = creds
        .select_provider(preferred)
        .ok_or_else(|| TubeGeniusError::MissingCredential {
            message: "set a Gemini or OpenAI API key (tube-genius keys set)".to_string(),
        })?;
    if let Some(p) = preferred
        && p != kind
    {
        tracing::warn!("No key for preferred provider {}, falling back to {}", p, kind);
    }
    create_provider(kind, creds, config)
}

pub(crate) fn send_error(kind: ProviderKind, err: reqwest::Error, timeout_ms: u64) -> TubeGeniusError {
    if err.is_timeout() {
        TubeGeniusError::Timeout {
            operation: format!("{} request", kind),
            timeout_ms,
        }
    } else {
        TubeGeniusError::provider(kind.as_str(), format!("HTTP request failed: {}", err))
    }
}

/// Turn a non-2xx response into a provider error carrying the (capped) body.
pub(crate) async fn ensure_success(
    kind: ProviderKind,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    let body: String = body.chars().take(ERROR_BODY_CAP).collect();
    Err(TubeGeniusError::provider(
        kind.as_str(),
        format!("API error {}: {}", status, body),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_are_reported() {
        let err = match select_provider(&Credentials::default(), &Config::default(), None) {
            Err(e) => e,
            Ok(_) => panic!("expected missing credential error"),
        };
        assert!(matches!(err, TubeGeniusError::MissingCredential { .. }));
    }

    #[test]
    fn falls_back_to_available_provider() {
        let creds = Credentials {
            gemini_api_key: None,
            openai_api_key: Some("sk-live-key".into()),
        };
        let provider =
            select_provider(&creds, &Config::default(), Some(ProviderKind::Gemini)).unwrap();
        assert_eq!(provider.kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn create_provider_requires_the_matching_key() {
        let creds = Credentials {
            gemini_api_key: Some("g-key-1234".into()),
            openai_api_key: None,
        };
        assert!(create_provider(ProviderKind::OpenAi, &creds, &Config::default()).is_err());
        let gemini = create_provider(ProviderKind::Gemini, &creds, &Config::default()).unwrap();
        assert_eq!(gemini.kind(), ProviderKind::Gemini);
    }
}
