use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::schemas::ProviderKind;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CONTEXT_LIMIT: usize = 500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Main configuration structure loaded from tube_genius.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
    /// File the settings were read from; `None` when defaults were used
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAIConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

/// Sampling and prompt shaping shared by both calls
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    /// Characters of the original input carried into the generation prompt
    pub context_limit: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub request_timeout_ms: u64,
    pub provider: Option<ProviderKind>,
    pub log_level: String,
    pub credentials_file: Option<PathBuf>,
    /// Problems found while reading the environment, logged once tracing is up
    pub warnings: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            provider: None,
            log_level: "tube_genius=info".to_string(),
            credentials_file: None,
            warnings: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut warnings = Vec::new();
        let provider = match std::env::var("TG_PROVIDER") {
            Ok(v) if !v.trim().is_empty() => match v.parse::<ProviderKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    warnings.push(format!("Ignoring unknown TG_PROVIDER value '{}'", v));
                    None
                }
            },
            _ => None,
        };

        Self {
            request_timeout_ms: std::env::var("TG_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            provider,
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "tube_genius=info".to_string()),
            credentials_file: std::env::var("TG_CREDENTIALS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            warnings,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and environment variables.
    /// Uses `path`, then TUBE_GENIUS_CONFIG, then "tube_genius.toml".
    ///
    /// Only a missing default file falls back to defaults; an explicit path
    /// that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        // TG_ENV_FILE if set, else ./.env
        if let Ok(env_path) = std::env::var("TG_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = path.map(Path::to_path_buf).unwrap_or_else(|| {
            PathBuf::from(
                std::env::var("TUBE_GENIUS_CONFIG")
                    .unwrap_or_else(|_| "tube_genius.toml".to_string()),
            )
        });

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                let mut config: Config = toml::from_str(&content)
                    .with_context(|| format!("Invalid config file {}", config_path.display()))?;
                config.source = Some(config_path);
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && path.is_none() => {
                Self::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config {}", config_path.display()));
            }
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GEMINI_MODEL")
            && !model.trim().is_empty()
        {
            tracing::debug!("GEMINI_MODEL env override applied");
            self.gemini.model = model;
        }
        if let Ok(url) = std::env::var("GEMINI_BASE_URL")
            && !url.trim().is_empty()
        {
            self.gemini.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL")
            && !model.trim().is_empty()
        {
            tracing::debug!("OPENAI_MODEL env override applied");
            self.openai.model = model;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL")
            && !url.trim().is_empty()
        {
            self.openai.base_url = url;
        }
    }

    /// Report where settings came from and any environment problems.
    /// Called after the subscriber is installed, since `load` runs before it.
    pub fn log_startup(&self) {
        match &self.source {
            Some(path) => tracing::debug!("Loaded config from {}", path.display()),
            None => tracing::debug!("No config file found, using defaults"),
        }
        for warning in &self.runtime.warnings {
            tracing::warn!("{}", warning);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!("generation.temperature must be between 0.0 and 2.0");
        }
        if self.generation.context_limit == 0 {
            anyhow::bail!("generation.context_limit must be > 0");
        }
        if self.runtime.request_timeout_ms == 0 {
            anyhow::bail!("TG_REQUEST_TIMEOUT_MS must be > 0");
        }
        if self.gemini.model.trim().is_empty() || self.openai.model.trim().is_empty() {
            anyhow::bail!("provider model names must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_endpoints() {
        let config = Config::default();
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.generation.context_limit, 500);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [openai]
            model = "gpt-4o"

            [generation]
            temperature = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.generation.context_limit, DEFAULT_CONTEXT_LIMIT);
        assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "tube-genius-missing-{}.toml",
            std::process::id()
        ));
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(
            format!("{:#}", err).contains("Failed to read config"),
            "{:#}",
            err
        );
    }

    #[test]
    fn explicit_path_is_recorded_as_source() {
        let path = std::env::temp_dir().join(format!(
            "tube-genius-source-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[generation]\ncontext_limit = 200\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.generation.context_limit, 200);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unknown_provider_is_deferred_as_a_warning() {
        unsafe {
            std::env::set_var("TG_PROVIDER", "claude");
        }
        let runtime = RuntimeConfig::load_from_env();
        unsafe {
            std::env::remove_var("TG_PROVIDER");
        }
        assert_eq!(runtime.provider, None);
        assert_eq!(runtime.warnings.len(), 1);
        assert!(runtime.warnings[0].contains("claude"));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.context_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.runtime.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
