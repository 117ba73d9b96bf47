//! Port traits for the collaborators the session depends on.
//!
//! The session controller only talks to these traits; concrete HTTP
//! implementations live in `tarot-interaction`, and tests substitute
//! scripted in-memory versions.

use crate::card::DrawnCard;
use crate::error::{BackendError, Result};
use crate::session::ChatMessage;
use crate::spread::Spread;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A finite, non-restartable sequence of text fragments.
///
/// Fragments carry no natural-language boundary guarantee; callers must
/// append them in delivery order.
pub type TextStream = BoxStream<'static, std::result::Result<String, BackendError>>;

/// One request to a generative backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    /// Prior turns replayed before `prompt`.
    pub history: Vec<ChatMessage>,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Generative-AI backend: single-shot completion and streamed completion.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Returns the complete response text.
    async fn complete(&self, request: GenerationRequest) -> std::result::Result<String, BackendError>;

    /// Opens a stream of response fragments.
    async fn stream(&self, request: GenerationRequest) -> std::result::Result<TextStream, BackendError>;
}

/// Supplies entropy for shuffling.
#[async_trait]
pub trait RandomnessProvider: Send + Sync {
    /// Returns exactly `count` non-negative integers.
    ///
    /// Only fails when no source at all is available.
    async fn acquire(&self, count: usize) -> Result<Vec<u32>>;
}

/// Maps a question to a spread id.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Always returns a known spread id; failures degrade to the default.
    async fn classify(&self, question: &str, model: &str) -> String;
}

/// Produces the streamed narrative reading.
#[async_trait]
pub trait ReadingGenerator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        spread: &Spread,
        cards: &[DrawnCard],
        model: &str,
    ) -> std::result::Result<TextStream, BackendError>;
}

/// Everything a follow-up reply is grounded in.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingContext {
    pub question: String,
    pub spread: Spread,
    pub cards: Vec<DrawnCard>,
    /// Reading text as generated (may contain HTML markup).
    pub reading: String,
}

/// Continues the conversation after a reading.
#[async_trait]
pub trait FollowUpConversationalist: Send + Sync {
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        message: &str,
        context: &ReadingContext,
        model: &str,
    ) -> std::result::Result<TextStream, BackendError>;
}
