use serde::{Deserialize, Serialize};

use super::Phase;
use crate::card::DrawnCard;

/// State changes published by the session controller.
///
/// Presentation layers subscribe to these instead of reaching into the
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session entered a new phase.
    PhaseChanged { phase: Phase },
    /// A spread was chosen for the reading.
    SpreadSelected { spread_id: String, automatic: bool },
    /// Randomness was acquired and the deck shuffled.
    DeckShuffled { entropy_values: usize },
    /// A card was placed at the next spread position.
    CardDrawn { card: DrawnCard },
    /// A fragment of the reading arrived.
    ReadingFragment { text: String },
    /// The reading stream ended.
    ReadingFinished { interrupted: bool },
    /// A user turn and an empty reply placeholder were appended.
    ReplyStarted { message: String },
    /// A fragment of the follow-up reply arrived.
    ReplyFragment { text: String },
    /// The follow-up reply stream ended.
    ReplyFinished { failed: bool },
    /// A pre-draw failure returned the session to input.
    Aborted { note: String },
    /// The session was cleared.
    Reset,
}
