//! Secret service implementation.
//!
//! Reads API keys from `secret.json`. The `GEMINI_API_KEY` and `API_KEY`
//! environment variables take precedence over the file.

use crate::paths::TarotPaths;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tarot_core::config::{GeminiConfig, SecretConfig};
use tarot_core::secret::SecretService;

/// Environment variables checked for a Gemini key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Service for managing secret configuration.
///
/// Loaded secrets are cached to avoid repeated file I/O.
///
/// # Example
///
/// ```ignore
/// use tarot_infrastructure::SecretServiceImpl;
/// use tarot_core::secret::SecretService;
///
/// let service = SecretServiceImpl::new(None)?;
/// let secrets = service.load_secrets().await?;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    /// Cached secret config.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    file_path: PathBuf,
    read_env: bool,
}

impl SecretServiceImpl {
    /// Creates a new SecretServiceImpl rooted at `base_path` (or the
    /// default config directory).
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let file_path = TarotPaths::new(base_path)
            .secret_file()
            .map_err(|e| anyhow::anyhow!("Failed to get secret path: {}", e))?;

        Ok(Self {
            secrets: Arc::new(RwLock::new(None)),
            file_path,
            read_env: true,
        })
    }

    /// Ignores environment overrides and only reads the file.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn read_file(&self) -> Result<SecretConfig, String> {
        if !self.file_path.exists() {
            tracing::debug!("[Secret] {} not found", self.file_path.display());
            return Ok(SecretConfig::default());
        }

        let content = std::fs::read_to_string(&self.file_path)
            .map_err(|e| format!("Failed to read secret file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse secret file: {}", e))
    }

    /// Loads the secrets if not already cached.
    fn load_secrets_internal(&self) -> Result<SecretConfig, String> {
        {
            let read_lock = self
                .secrets
                .read()
                .map_err(|_| "Secret cache lock poisoned".to_string())?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let file_config = self.read_file()?;
        let loaded = if self.read_env {
            apply_env_overrides(file_config, |name| std::env::var(name).ok())
        } else {
            file_config
        };

        {
            let mut write_lock = self
                .secrets
                .write()
                .map_err(|_| "Secret cache lock poisoned".to_string())?;
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

/// Replaces the Gemini key with the first non-empty variable from
/// [`API_KEY_ENV_VARS`], keeping any configured model name.
pub fn apply_env_overrides(
    mut config: SecretConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> SecretConfig {
    let env_key = API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty());

    if let Some(api_key) = env_key {
        let model_name = config.gemini.and_then(|gemini| gemini.model_name);
        config.gemini = Some(GeminiConfig { api_key, model_name });
    }
    config
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        self.load_secrets_internal()
    }
}
