//! Session phase types.

use serde::{Deserialize, Serialize};

/// The phase of a reading session.
///
/// Phases advance linearly `Input → AnalyzingIntent → Shuffling → Drawing →
/// Reading`; manual spread selection skips `AnalyzingIntent`, and a reset
/// returns to `Input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Waiting for the user's question.
    #[default]
    Input,
    /// The intent classifier is choosing a spread.
    AnalyzingIntent,
    /// Randomness is being acquired and the deck shuffled.
    Shuffling,
    /// The user draws cards one at a time.
    Drawing,
    /// The reading streams in; follow-up chat becomes available once it ends.
    Reading,
}
