//! Intent classification: question → spread id.

use crate::prompts::intent_prompt;
use async_trait::async_trait;
use std::sync::Arc;
use tarot_core::deck::{DEFAULT_SPREAD_ID, find_spread, spreads};
use tarot_core::ports::{GenerationRequest, GenerativeBackend, IntentClassifier};

/// Asks a generative backend which spread fits a question.
///
/// Any failure (transport, empty reply, unknown id) degrades to
/// [`DEFAULT_SPREAD_ID`]. One call, no retry.
pub struct GeminiIntentClassifier {
    backend: Arc<dyn GenerativeBackend>,
}

impl GeminiIntentClassifier {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }
}

/// Maps a raw model reply onto a known spread id.
pub fn resolve_spread_id(reply: &str) -> &'static str {
    let candidate = reply.trim().trim_matches('`').trim();
    match find_spread(candidate) {
        Some(spread) => spread.id.as_str(),
        None => {
            tracing::warn!("[Intent] Unknown spread id {:?}, using default", candidate);
            DEFAULT_SPREAD_ID
        }
    }
}

#[async_trait]
impl IntentClassifier for GeminiIntentClassifier {
    async fn classify(&self, question: &str, model: &str) -> String {
        let prompt = match intent_prompt(question, spreads()) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("[Intent] {}", e);
                return DEFAULT_SPREAD_ID.to_string();
            }
        };

        match self.backend.complete(GenerationRequest::new(model, prompt)).await {
            Ok(reply) => {
                let id = resolve_spread_id(&reply);
                tracing::info!("[Intent] Selected spread: {}", id);
                id.to_string()
            }
            Err(e) => {
                tracing::warn!("[Intent] Classification failed, using default: {}", e);
                DEFAULT_SPREAD_ID.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use tarot_core::error::BackendError;

    #[tokio::test]
    async fn test_valid_reply_is_trimmed_and_accepted() {
        let backend = Arc::new(RecordingBackend::replying(&["  decision_making\n"]));
        let classifier = GeminiIntentClassifier::new(backend.clone());

        let id = classifier.classify("A or B?", "gemini-2.5-flash").await;
        assert_eq!(id, "decision_making");

        let request = backend.last_request();
        assert_eq!(request.model, "gemini-2.5-flash");
        assert!(request.prompt.contains("A or B?"));
    }

    #[tokio::test]
    async fn test_unknown_reply_falls_back_to_default() {
        let backend = Arc::new(RecordingBackend::replying(&["I suggest the Celtic Cross!"]));
        let classifier = GeminiIntentClassifier::new(backend);
        assert_eq!(classifier.classify("q", "m").await, DEFAULT_SPREAD_ID);
    }

    #[tokio::test]
    async fn test_backend_error_falls_back_to_default() {
        let backend = Arc::new(RecordingBackend::failing(BackendError::request("down", true)));
        let classifier = GeminiIntentClassifier::new(backend);
        assert_eq!(classifier.classify("q", "m").await, DEFAULT_SPREAD_ID);
    }

    #[test]
    fn test_resolve_spread_id_always_known() {
        for reply in ["single_card", "`celtic_cross_simple`", "", "three", "SINGLE_CARD"] {
            assert!(find_spread(resolve_spread_id(reply)).is_some());
        }
    }
}
