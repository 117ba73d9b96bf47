//! Outbound adapters: Gemini REST agent, quantum randomness and the
//! prompt-driven classifier, reading generator and follow-up chat built on
//! top of them.

pub mod follow_up;
pub mod gemini_api_agent;
pub mod intent;
pub mod prompts;
pub mod quantum;
pub mod reading;
pub mod sse;
pub mod supported_models;

#[cfg(test)]
mod testing;

pub use follow_up::GeminiFollowUpConversationalist;
pub use gemini_api_agent::GeminiApiAgent;
pub use intent::GeminiIntentClassifier;
pub use quantum::{EntropySource, LocalRandomProvider, QuantumRandomProvider};
pub use reading::GeminiReadingGenerator;
