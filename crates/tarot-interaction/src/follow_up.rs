//! Follow-up chat grounded in a finished reading.

use crate::prompts::follow_up_instruction;
use async_trait::async_trait;
use std::sync::Arc;
use tarot_core::error::BackendError;
use tarot_core::ports::{
    FollowUpConversationalist, GenerationRequest, GenerativeBackend, ReadingContext, TextStream,
};
use tarot_core::session::ChatMessage;

/// Default number of reading characters sent as context.
pub const DEFAULT_READING_CONTEXT_CHARS: usize = 2000;

/// Replays the chat history under a system instruction describing the
/// reading, then streams the reply to the new message.
pub struct GeminiFollowUpConversationalist {
    backend: Arc<dyn GenerativeBackend>,
    reading_chars: usize,
}

impl GeminiFollowUpConversationalist {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            reading_chars: DEFAULT_READING_CONTEXT_CHARS,
        }
    }

    /// Limits how much of the stripped reading is included.
    pub fn with_reading_chars(mut self, reading_chars: usize) -> Self {
        self.reading_chars = reading_chars;
        self
    }
}

#[async_trait]
impl FollowUpConversationalist for GeminiFollowUpConversationalist {
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        message: &str,
        context: &ReadingContext,
        model: &str,
    ) -> Result<TextStream, BackendError> {
        let instruction = follow_up_instruction(context, self.reading_chars)?;
        tracing::debug!(history = history.len(), "[FollowUp] Requesting reply stream");

        let request = GenerationRequest::new(model, message)
            .with_system_instruction(instruction)
            .with_history(history.to_vec());
        self.backend.stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use futures::StreamExt;
    use tarot_core::card::DrawnCard;
    use tarot_core::deck::{find_spread, reference_deck};

    fn context() -> ReadingContext {
        ReadingContext {
            question: "Career?".into(),
            spread: find_spread("single_card").unwrap().clone(),
            cards: vec![DrawnCard::new(reference_deck()[19].clone(), false, 0)],
            reading: "<h3>综合指引</h3><p>阳光普照</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_history_and_instruction_are_forwarded() {
        let backend = Arc::new(RecordingBackend::replying(&["ok"]));
        let chat = GeminiFollowUpConversationalist::new(backend.clone()).with_reading_chars(4);
        let history = vec![ChatMessage::user("Why?"), ChatMessage::assistant("Because.")];

        let reply: Vec<String> = chat
            .continue_chat(&history, "And now?", &context(), "gemini-2.5-flash")
            .await
            .unwrap()
            .map(|fragment| fragment.unwrap())
            .collect()
            .await;
        assert_eq!(reply, vec!["ok"]);

        let request = backend.last_request();
        assert_eq!(request.prompt, "And now?");
        assert_eq!(request.history, history);
        let instruction = request.system_instruction.unwrap();
        assert!(instruction.contains("综合指引..."));
        assert!(!instruction.contains("<h3>"));
    }

    #[tokio::test]
    async fn test_empty_history_is_allowed() {
        let backend = Arc::new(RecordingBackend::replying(&["hi"]));
        let chat = GeminiFollowUpConversationalist::new(backend.clone());
        assert!(chat.continue_chat(&[], "Hello", &context(), "m").await.is_ok());
        assert!(backend.last_request().history.is_empty());
    }
}
