//! Wires the Gemini-backed adapters into a [`ReadingSessionUseCase`].

use crate::session_usecase::{ReadingSessionUseCase, SessionPorts};
use anyhow::{Context, Result};
use std::sync::Arc;
use tarot_core::config::{AppConfig, ModelTier};
use tarot_core::ports::{GenerativeBackend, RandomnessProvider};
use tarot_core::secret::SecretService;
use tarot_interaction::{
    GeminiApiAgent, GeminiFollowUpConversationalist, GeminiIntentClassifier,
    GeminiReadingGenerator, LocalRandomProvider, QuantumRandomProvider,
};

/// Options chosen per run rather than in `config.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub tier: ModelTier,
    /// Skip the quantum service entirely.
    pub local_random: bool,
}

/// Builds the ports around one shared backend.
pub fn build_ports(
    backend: Arc<dyn GenerativeBackend>,
    config: &AppConfig,
    local_random: bool,
) -> SessionPorts {
    let randomness: Arc<dyn RandomnessProvider> = if local_random || !config.quantum.enabled {
        Arc::new(LocalRandomProvider)
    } else {
        Arc::new(QuantumRandomProvider::new(&config.quantum))
    };

    SessionPorts {
        randomness,
        classifier: Arc::new(GeminiIntentClassifier::new(backend.clone())),
        reading: Arc::new(GeminiReadingGenerator::new(backend.clone())),
        follow_up: Arc::new(
            GeminiFollowUpConversationalist::new(backend)
                .with_reading_chars(config.session.reading_context_chars),
        ),
    }
}

/// Creates a session use case talking to Gemini with the configured key.
///
/// A `model_name` in `secret.json` replaces the flash-tier model from
/// `config.toml`.
pub async fn build_gemini_session(
    config: &AppConfig,
    secrets: &dyn SecretService,
    options: SessionOptions,
) -> Result<ReadingSessionUseCase> {
    let agent = GeminiApiAgent::try_from_secrets(secrets)
        .await
        .context("Gemini API key is not configured (set GEMINI_API_KEY or secret.json)")?;
    tracing::info!("[Bootstrap] Gemini agent ready");

    let mut config = config.clone();
    let model_override = secrets
        .load_secrets()
        .await
        .ok()
        .and_then(|s| s.gemini)
        .and_then(|gemini| gemini.model_name)
        .filter(|model| !model.trim().is_empty());
    if let Some(model) = model_override {
        tracing::info!("[Bootstrap] Flash model overridden by secret.json: {}", model);
        config.models.flash = model;
    }

    let ports = build_ports(Arc::new(agent), &config, options.local_random);
    Ok(ReadingSessionUseCase::new(ports, &config).with_tier(options.tier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_core::config::{GeminiConfig, SecretConfig};

    struct StaticSecrets(SecretConfig);

    #[async_trait::async_trait]
    impl SecretService for StaticSecrets {
        async fn load_secrets(&self) -> std::result::Result<SecretConfig, String> {
            Ok(self.0.clone())
        }
    }

    fn secrets(api_key: &str, model_name: Option<&str>) -> StaticSecrets {
        StaticSecrets(SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: api_key.to_string(),
                model_name: model_name.map(str::to_string),
            }),
        })
    }

    #[tokio::test]
    async fn test_secret_model_name_replaces_flash_model() {
        let config = AppConfig::default();
        let options = SessionOptions {
            tier: ModelTier::Flash,
            local_random: true,
        };

        let use_case = build_gemini_session(&config, &secrets("k", Some("gemini-2.5-pro")), options)
            .await
            .unwrap();
        assert_eq!(use_case.model(), "gemini-2.5-pro");

        let mut use_case = build_gemini_session(&config, &secrets("k", None), options)
            .await
            .unwrap();
        assert_eq!(use_case.model(), config.models.flash);
        use_case.set_tier(ModelTier::Pro);
        assert_eq!(use_case.model(), config.models.pro);
    }

    #[tokio::test]
    async fn test_missing_key_fails_bootstrap() {
        let result = build_gemini_session(
            &AppConfig::default(),
            &secrets("  ", None),
            SessionOptions::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
