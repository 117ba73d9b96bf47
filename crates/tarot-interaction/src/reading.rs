//! Streamed narrative reading.

use crate::prompts::reading_prompt;
use async_trait::async_trait;
use std::sync::Arc;
use tarot_core::card::DrawnCard;
use tarot_core::error::BackendError;
use tarot_core::ports::{GenerationRequest, GenerativeBackend, ReadingGenerator, TextStream};
use tarot_core::spread::Spread;

/// Builds the reading prompt and opens a backend stream for it.
pub struct GeminiReadingGenerator {
    backend: Arc<dyn GenerativeBackend>,
}

impl GeminiReadingGenerator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ReadingGenerator for GeminiReadingGenerator {
    async fn generate(
        &self,
        question: &str,
        spread: &Spread,
        cards: &[DrawnCard],
        model: &str,
    ) -> Result<TextStream, BackendError> {
        let prompt = reading_prompt(question, spread, cards)?;
        tracing::debug!(
            spread = %spread.id,
            cards = cards.len(),
            "[Reading] Requesting reading stream"
        );
        self.backend.stream(GenerationRequest::new(model, prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use futures::StreamExt;
    use tarot_core::deck::{find_spread, reference_deck};

    #[tokio::test]
    async fn test_generate_streams_backend_fragments() {
        let backend = Arc::new(RecordingBackend::replying(&["<h3>开场", "白</h3>"]));
        let generator = GeminiReadingGenerator::new(backend.clone());
        let spread = find_spread("single_card").unwrap();
        let cards = vec![DrawnCard::new(reference_deck()[10].clone(), true, 0)];

        let stream = generator
            .generate("What should I focus on?", spread, &cards, "gemini-3-pro-preview")
            .await
            .unwrap();
        let text: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(text.concat(), "<h3>开场白</h3>");

        let request = backend.last_request();
        assert_eq!(request.model, "gemini-3-pro-preview");
        assert!(request.history.is_empty());
        assert!(request.prompt.contains("核心指引"));
        assert!(request.prompt.contains("逆位 (Reversed)"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_returned() {
        let backend = Arc::new(RecordingBackend::failing(BackendError::EmptyResponse));
        let generator = GeminiReadingGenerator::new(backend);
        let spread = find_spread("single_card").unwrap();
        assert!(generator.generate("q", spread, &[], "m").await.is_err());
    }
}
