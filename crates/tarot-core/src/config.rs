//! Configuration types.
//!
//! `AppConfig` is read from `config.toml`; every field has a default so a
//! missing or partial file still yields a usable configuration.
//! `SecretConfig` is read from `secret.json`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model for every call.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Higher-quality model used when the pro tier is requested.
pub const GEMINI_3_PRO_MODEL: &str = "gemini-3-pro-preview";
/// ANU quantum random number endpoint.
pub const DEFAULT_QUANTUM_ENDPOINT: &str = "https://qrng.anu.edu.au/API/jsonI.php";

/// Root configuration (`config.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelConfig,
    pub quantum: QuantumConfig,
    pub session: SessionConfig,
}

/// Which model tier a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    #[default]
    Flash,
    Pro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub flash: String,
    pub pro: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            flash: DEFAULT_GEMINI_MODEL.to_string(),
            pro: GEMINI_3_PRO_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    /// Model id for the given tier.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Flash => &self.flash,
            ModelTier::Pro => &self.pro,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantumConfig {
    /// When false, randomness always comes from the local CSPRNG.
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for QuantumConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_QUANTUM_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl QuantumConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pause between shuffling and drawing.
    pub shuffle_delay_ms: u64,
    /// Maximum wait for the next stream fragment before the stream is
    /// treated as failed.
    pub stream_idle_timeout_secs: u64,
    /// How many characters of the (tag-stripped) reading are sent along
    /// with follow-up questions.
    pub reading_context_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shuffle_delay_ms: 1500,
            stream_idle_timeout_secs: 60,
            reading_context_chars: 2000,
        }
    }
}

impl SessionConfig {
    pub fn shuffle_delay(&self) -> Duration {
        Duration::from_millis(self.shuffle_delay_ms)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

/// Root structure of `secret.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [quantum]
            enabled = false

            [session]
            shuffle_delay_ms = 0
            "#,
        )
        .unwrap();

        assert!(!config.quantum.enabled);
        assert_eq!(config.quantum.endpoint, DEFAULT_QUANTUM_ENDPOINT);
        assert_eq!(config.session.shuffle_delay(), Duration::ZERO);
        assert_eq!(config.session.reading_context_chars, 2000);
        assert_eq!(config.models.model_for(ModelTier::Flash), DEFAULT_GEMINI_MODEL);
        assert_eq!(config.models.model_for(ModelTier::Pro), GEMINI_3_PRO_MODEL);
    }

    #[test]
    fn test_secret_config_without_gemini() {
        let secrets: SecretConfig = serde_json::from_str("{}").unwrap();
        assert!(secrets.gemini.is_none());
    }
}
