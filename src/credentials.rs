//! API key storage.
//!
//! Keys live in a small JSON file under the user's config directory. The
//! file is read once at startup and written only through [`CredentialStore::save`].
//! `GEMINI_API_KEY` / `OPENAI_API_KEY` from the environment win for the
//! current session but are never written back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TubeGeniusError};
use crate::schemas::ProviderKind;

pub const GEMINI_KEY: &str = "gemini_api_key";
pub const OPENAI_KEY: &str = "openai_api_key";
const CREDENTIALS_FILE: &str = "credentials.json";
const APP_DIR: &str = "tube-genius";

/// Provider keys available to this session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "gemini_api_key", default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(rename = "openai_api_key", default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

pub fn is_placeholder(value: &str) -> bool {
    let t = value.trim();
    t.is_empty()
        || t.contains("${")
        || t.eq_ignore_ascii_case("your-api-key-here")
        || t.eq_ignore_ascii_case("changeme")
}

impl Credentials {
    pub fn key_for(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
        };
        key.filter(|k| !is_placeholder(k))
    }

    pub fn has_any(&self) -> bool {
        self.key_for(ProviderKind::Gemini).is_some() || self.key_for(ProviderKind::OpenAi).is_some()
    }

    /// Pick the provider to use.
    ///
    /// A preference is honoured when its key exists; otherwise Gemini is
    /// tried before OpenAI.
    pub fn select_provider(&self, preferred: Option<ProviderKind>) -> Option<ProviderKind> {
        if let Some(kind) = preferred
            && self.key_for(kind).is_some()
        {
            return Some(kind);
        }
        [ProviderKind::Gemini, ProviderKind::OpenAi]
            .into_iter()
            .find(|kind| self.key_for(*kind).is_some())
    }

    /// Overlay non-placeholder keys from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY")
            && !is_placeholder(&key)
        {
            debug!("GEMINI_API_KEY env override applied");
            self.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !is_placeholder(&key)
        {
            debug!("OPENAI_API_KEY env override applied");
            self.openai_api_key = Some(key);
        }
        self
    }
}

/// Show the first and last few characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// File-backed credential storage
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `override_path`, or `<config_dir>/tube-genius/credentials.json`.
    pub fn open_default(override_path: Option<&Path>) -> Result<Self> {
        if let Some(p) = override_path {
            return Ok(Self::new(p));
        }
        let base = dirs::config_dir().ok_or_else(|| TubeGeniusError::Config {
            message: "could not determine the user config directory".to_string(),
        })?;
        Ok(Self::new(base.join(APP_DIR).join(CREDENTIALS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read stored keys; a missing file means no keys.
    pub fn load(&self) -> Result<Credentials> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let creds: Credentials = serde_json::from_str(&content).map_err(|e| {
                    TubeGeniusError::Config {
                        message: format!(
                            "credential file {} is not valid JSON: {}",
                            self.path.display(),
                            e
                        ),
                    }
                })?;
                debug!("Loaded credentials from {}", self.path.display());
                Ok(creds)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Credentials::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(creds)?;
        std::fs::write(&self.path, body)?;
        restrict_permissions(&self.path)?;
        info!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
