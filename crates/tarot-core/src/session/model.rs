//! Session aggregate.
//!
//! `Session` owns everything a single reading produces. Every mutation goes
//! through a transition method that checks the current phase first, so the
//! invariants below hold no matter which front-end drives it:
//!
//! - `drawn_cards.len() <= spread.positions.len()`
//! - `drawn_cards[i].spread_position_index == i`
//! - the reading text only grows until `reset`
//! - only the trailing assistant turn changes, and only while a reply streams

use super::message::{ChatMessage, ChatRole};
use super::phase::Phase;
use crate::card::{Card, DrawnCard};
use crate::error::{Result, TarotError};
use crate::spread::Spread;
use serde::{Deserialize, Serialize};

/// Appended to the reading when its stream breaks off.
pub const READING_INTERRUPTED_NOTICE: &str = "\n\n(连接中断，请稍后再试...)";

/// Assistant text used when a follow-up reply fails.
pub const REPLY_FAILED_NOTICE: &str = "(连接中断，请重试...)";

/// Error note shown after a pre-draw failure.
pub const CONNECTION_FAILED_NOTE: &str = "连接宇宙能量失败，请重试。";

/// A single user reading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    phase: Phase,
    question: String,
    spread: Option<Spread>,
    #[serde(skip)]
    deck: Vec<Card>,
    drawn_cards: Vec<DrawnCard>,
    reading: String,
    reading_complete: bool,
    chat_history: Vec<ChatMessage>,
    reply_in_flight: bool,
    error_note: Option<String>,
    created_at: String,
    updated_at: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session in the `Input` phase.
    pub fn new() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phase: Phase::Input,
            question: String::new(),
            spread: None,
            deck: Vec::new(),
            drawn_cards: Vec::new(),
            reading: String::new(),
            reading_complete: false,
            chat_history: Vec::new(),
            reply_in_flight: false,
            error_note: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn spread(&self) -> Option<&Spread> {
        self.spread.as_ref()
    }

    /// The shuffled deck cards are drawn from.
    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn drawn_cards(&self) -> &[DrawnCard] {
        &self.drawn_cards
    }

    pub fn reading(&self) -> &str {
        &self.reading
    }

    pub fn is_reading_complete(&self) -> bool {
        self.reading_complete
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn is_reply_in_flight(&self) -> bool {
        self.reply_in_flight
    }

    pub fn error_note(&self) -> Option<&str> {
        self.error_note.as_deref()
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    /// Cards still to draw before the reading starts.
    pub fn remaining_draws(&self) -> usize {
        self.spread
            .as_ref()
            .map(|s| s.card_count().saturating_sub(self.drawn_cards.len()))
            .unwrap_or(0)
    }

    /// Whether a follow-up message would be accepted right now.
    pub fn can_follow_up(&self) -> bool {
        self.phase == Phase::Reading && self.reading_complete && !self.reply_in_flight
    }

    // ============================================================================
    // Input → AnalyzingIntent → Shuffling
    // ============================================================================

    /// Records a new question. Clears the previous error note and transcript.
    pub fn submit_question(&mut self, question: &str) -> Result<()> {
        self.expect_phase("submit_question", &[Phase::Input])?;
        if question.trim().is_empty() {
            return Err(TarotError::EmptyQuestion);
        }

        self.question = question.to_string();
        self.error_note = None;
        self.chat_history.clear();
        self.spread = None;
        self.touch();
        Ok(())
    }

    /// `Input → AnalyzingIntent`.
    pub fn begin_intent_analysis(&mut self) -> Result<()> {
        self.expect_phase("begin_intent_analysis", &[Phase::Input])?;
        self.expect_question()?;
        self.phase = Phase::AnalyzingIntent;
        self.touch();
        Ok(())
    }

    /// `Input | AnalyzingIntent → Shuffling` with the chosen spread.
    pub fn select_spread(&mut self, spread: Spread) -> Result<()> {
        self.expect_phase("select_spread", &[Phase::Input, Phase::AnalyzingIntent])?;
        self.expect_question()?;
        self.spread = Some(spread);
        self.phase = Phase::Shuffling;
        self.touch();
        Ok(())
    }

    /// Installs a freshly shuffled deck and clears the previous draw.
    pub fn apply_shuffle(&mut self, deck: Vec<Card>) -> Result<()> {
        self.expect_phase("apply_shuffle", &[Phase::Shuffling])?;
        let needed = self.spread.as_ref().map(Spread::card_count).unwrap_or(0);
        if deck.len() < needed {
            return Err(TarotError::randomness(format!(
                "shuffled deck has {} cards, spread needs {}",
                deck.len(),
                needed
            )));
        }

        self.deck = deck;
        self.drawn_cards.clear();
        self.reading.clear();
        self.reading_complete = false;
        self.touch();
        Ok(())
    }

    /// `Shuffling → Drawing`.
    pub fn finish_shuffle(&mut self) -> Result<()> {
        self.expect_phase("finish_shuffle", &[Phase::Shuffling])?;
        if self.deck.is_empty() {
            return Err(TarotError::randomness("deck was never shuffled"));
        }
        self.phase = Phase::Drawing;
        self.touch();
        Ok(())
    }

    /// Returns to `Input` after a pre-draw failure, keeping the question.
    pub fn abort(&mut self, note: impl Into<String>) {
        self.phase = Phase::Input;
        self.spread = None;
        self.deck.clear();
        self.drawn_cards.clear();
        self.error_note = Some(note.into());
        self.touch();
    }

    // ============================================================================
    // Drawing
    // ============================================================================

    /// Draws the next card from the deck into the next spread position.
    ///
    /// Moves to `Reading` once every position is filled.
    pub fn draw(&mut self, is_reversed: bool) -> Result<DrawnCard> {
        self.expect_phase("draw", &[Phase::Drawing])?;
        let Some(spread) = self.spread.as_ref() else {
            return Err(TarotError::invalid_phase("draw", self.phase));
        };

        let next_index = self.drawn_cards.len();
        if next_index >= spread.card_count() {
            return Err(TarotError::SpreadFull {
                spread_id: spread.id.clone(),
                positions: spread.card_count(),
            });
        }
        let card = self
            .deck
            .get(next_index)
            .cloned()
            .ok_or_else(|| TarotError::randomness("deck exhausted"))?;

        let drawn = DrawnCard::new(card, is_reversed, next_index);
        self.drawn_cards.push(drawn.clone());

        if self.drawn_cards.len() == spread.card_count() {
            self.phase = Phase::Reading;
        }
        self.touch();
        Ok(drawn)
    }

    // ============================================================================
    // Reading
    // ============================================================================

    /// Appends one reading fragment.
    pub fn append_reading(&mut self, fragment: &str) -> Result<()> {
        self.expect_phase("append_reading", &[Phase::Reading])?;
        if self.reading_complete {
            return Err(TarotError::invalid_phase("append_reading", self.phase));
        }
        self.reading.push_str(fragment);
        Ok(())
    }

    /// Marks the reading stream as finished.
    pub fn finish_reading(&mut self) -> Result<()> {
        self.expect_phase("finish_reading", &[Phase::Reading])?;
        self.reading_complete = true;
        self.touch();
        Ok(())
    }

    /// Keeps the partial reading, appends the interruption notice once and
    /// ends the stream.
    pub fn interrupt_reading(&mut self) -> Result<()> {
        self.expect_phase("interrupt_reading", &[Phase::Reading])?;
        if !self.reading_complete {
            self.reading.push_str(READING_INTERRUPTED_NOTICE);
            self.reading_complete = true;
            self.touch();
        }
        Ok(())
    }

    // ============================================================================
    // Follow-up chat
    // ============================================================================

    /// Appends the user turn and one empty assistant placeholder.
    ///
    /// Returns the history *before* this turn, which is what gets replayed
    /// to the backend.
    pub fn begin_follow_up(&mut self, message: &str) -> Result<Vec<ChatMessage>> {
        self.expect_phase("begin_follow_up", &[Phase::Reading])?;
        if !self.reading_complete {
            return Err(TarotError::ReadingInProgress);
        }
        if self.reply_in_flight {
            return Err(TarotError::ReplyInFlight);
        }
        if message.trim().is_empty() {
            return Err(TarotError::EmptyMessage);
        }

        let prior = self.chat_history.clone();
        self.chat_history.push(ChatMessage::user(message));
        self.chat_history.push(ChatMessage::assistant(""));
        self.reply_in_flight = true;
        self.touch();
        Ok(prior)
    }

    /// Appends a fragment to the streaming assistant turn.
    pub fn append_reply(&mut self, fragment: &str) -> Result<()> {
        let turn = self.streaming_turn("append_reply")?;
        turn.text.push_str(fragment);
        Ok(())
    }

    /// Completes the streaming assistant turn. A reply that produced no text
    /// is treated as a failure so the turn is never left empty.
    pub fn finish_reply(&mut self) -> Result<()> {
        let empty = self.streaming_turn("finish_reply")?.text.is_empty();
        if empty {
            return self.fail_reply();
        }
        self.reply_in_flight = false;
        self.touch();
        Ok(())
    }

    /// Completes the streaming assistant turn with the failure notice.
    pub fn fail_reply(&mut self) -> Result<()> {
        let turn = self.streaming_turn("fail_reply")?;
        if turn.text.is_empty() {
            turn.text.push_str(REPLY_FAILED_NOTICE);
        } else {
            turn.text.push_str("\n\n");
            turn.text.push_str(REPLY_FAILED_NOTICE);
        }
        self.reply_in_flight = false;
        self.touch();
        Ok(())
    }

    // ============================================================================
    // Reset
    // ============================================================================

    /// Clears the question, cards, reading and transcript; back to `Input`.
    pub fn reset(&mut self) {
        self.phase = Phase::Input;
        self.question.clear();
        self.spread = None;
        self.deck.clear();
        self.drawn_cards.clear();
        self.reading.clear();
        self.reading_complete = false;
        self.chat_history.clear();
        self.reply_in_flight = false;
        self.error_note = None;
        self.touch();
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TarotError::invalid_phase(operation, self.phase))
        }
    }

    fn expect_question(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            Err(TarotError::EmptyQuestion)
        } else {
            Ok(())
        }
    }

    fn streaming_turn(&mut self, operation: &'static str) -> Result<&mut ChatMessage> {
        if !self.reply_in_flight {
            return Err(TarotError::invalid_phase(operation, self.phase));
        }
        match self.chat_history.last_mut() {
            Some(turn) if turn.role == ChatRole::Assistant => Ok(turn),
            _ => Err(TarotError::invalid_phase(operation, self.phase)),
        }
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
