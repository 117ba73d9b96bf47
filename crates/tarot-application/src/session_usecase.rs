//! Reading session use case.
//!
//! `ReadingSessionUseCase` is the single owner of a [`Session`]. It drives
//! the phases `Input → AnalyzingIntent → Shuffling → Drawing → Reading`,
//! calls the ports at the right moments and publishes every change as a
//! [`SessionEvent`].
//!
//! Every transition takes `&mut self`, so two transitions can never
//! overlap. Fragments of one stream are applied in delivery order.

use futures::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tarot_core::config::{AppConfig, ModelConfig, ModelTier, SessionConfig};
use tarot_core::deck::{DECK_SIZE, is_known_spread, spread_or_default};
use tarot_core::error::{BackendError, Result, TarotError};
use tarot_core::ports::{
    FollowUpConversationalist, IntentClassifier, ReadingContext, ReadingGenerator,
    RandomnessProvider, TextStream,
};
use tarot_core::session::{CONNECTION_FAILED_NOTE, Phase, Session, SessionEvent};
use tarot_core::shuffle::shuffled_deck;
use tarot_core::spread::SpreadChoice;
use tarot_core::{DrawnCard, Spread};
use tokio::sync::mpsc::UnboundedSender;

/// The collaborators a session talks to.
#[derive(Clone)]
pub struct SessionPorts {
    pub randomness: Arc<dyn RandomnessProvider>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub reading: Arc<dyn ReadingGenerator>,
    pub follow_up: Arc<dyn FollowUpConversationalist>,
}

/// How a consumed stream ended.
#[derive(Debug, PartialEq)]
enum StreamOutcome {
    Completed,
    Failed(BackendError),
}

/// Use case driving one reading session at a time.
pub struct ReadingSessionUseCase {
    session: Session,
    ports: SessionPorts,
    settings: SessionConfig,
    models: ModelConfig,
    tier: ModelTier,
    events: Option<UnboundedSender<SessionEvent>>,
    rng: StdRng,
}

impl ReadingSessionUseCase {
    pub fn new(ports: SessionPorts, config: &AppConfig) -> Self {
        Self {
            session: Session::new(),
            ports,
            settings: config.session.clone(),
            models: config.models.clone(),
            tier: ModelTier::default(),
            events: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Publishes events on `sender`.
    pub fn with_events(mut self, sender: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    /// Makes card reversals reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    pub fn set_tier(&mut self, tier: ModelTier) {
        self.tier = tier;
    }

    /// Model id used for every call of the current tier.
    pub fn model(&self) -> &str {
        self.models.model_for(self.tier)
    }

    // ============================================================================
    // Input → AnalyzingIntent → Shuffling → Drawing
    // ============================================================================

    /// Submits a question and prepares the deck.
    ///
    /// On success the session is in `Drawing`. A failure while acquiring
    /// randomness or shuffling returns the session to `Input` with the
    /// connection error note; the question is kept.
    pub async fn submit(&mut self, question: &str, choice: SpreadChoice) -> Result<()> {
        self.session.submit_question(question)?;
        tracing::info!("[Session] Question submitted ({})", self.session.id());

        let (spread, automatic) = match choice {
            SpreadChoice::Auto => {
                self.session.begin_intent_analysis()?;
                self.emit_phase();
                let id = self
                    .ports
                    .classifier
                    .classify(self.session.question(), self.model())
                    .await;
                (spread_or_default(&id).clone(), true)
            }
            SpreadChoice::Manual(id) => {
                if !is_known_spread(&id) {
                    tracing::warn!("[Session] Unknown spread '{}', using default", id);
                }
                (spread_or_default(&id).clone(), false)
            }
        };

        let spread_id = spread.id.clone();
        self.session.select_spread(spread)?;
        tracing::info!("[Session] Spread selected: {} (automatic: {})", spread_id, automatic);
        self.emit(SessionEvent::SpreadSelected {
            spread_id,
            automatic,
        });
        self.emit_phase();

        if let Err(e) = self.shuffle().await {
            tracing::warn!("[Session] Shuffle failed: {}", e);
            self.session.abort(CONNECTION_FAILED_NOTE);
            self.emit(SessionEvent::Aborted {
                note: CONNECTION_FAILED_NOTE.to_string(),
            });
            self.emit_phase();
            return Err(e);
        }
        Ok(())
    }

    async fn shuffle(&mut self) -> Result<()> {
        let randoms = self.ports.randomness.acquire(DECK_SIZE).await?;
        if randoms.len() != DECK_SIZE {
            return Err(TarotError::randomness(format!(
                "expected {} random values, got {}",
                DECK_SIZE,
                randoms.len()
            )));
        }

        let deck = shuffled_deck(&randoms)?;
        self.session.apply_shuffle(deck)?;
        self.emit(SessionEvent::DeckShuffled {
            entropy_values: randoms.len(),
        });

        let delay = self.settings.shuffle_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.session.finish_shuffle()?;
        self.emit_phase();
        Ok(())
    }

    // ============================================================================
    // Drawing → Reading
    // ============================================================================

    /// Draws the next card with a random orientation.
    ///
    /// Drawing the last card moves the session to `Reading` and consumes
    /// the whole reading stream before returning. Reading failures never
    /// surface here; they end up as the interruption notice.
    pub async fn draw(&mut self) -> Result<DrawnCard> {
        let is_reversed = self.rng.gen_bool(0.5);
        let drawn = self.session.draw(is_reversed)?;
        tracing::debug!(
            "[Session] Drew {} at position {}",
            drawn.card.english_name,
            drawn.spread_position_index
        );
        self.emit(SessionEvent::CardDrawn {
            card: drawn.clone(),
        });

        if self.session.phase() == Phase::Reading {
            self.emit_phase();
            self.generate_reading().await?;
        }
        Ok(drawn)
    }

    async fn generate_reading(&mut self) -> Result<()> {
        let spread = self.active_spread("generate_reading")?;
        let opened = self
            .ports
            .reading
            .generate(
                self.session.question(),
                &spread,
                self.session.drawn_cards(),
                self.models.model_for(self.tier),
            )
            .await;

        let outcome = match opened {
            Ok(stream) => {
                let idle = self.settings.stream_idle_timeout();
                consume(stream, idle, |text| {
                    self.session.append_reading(&text)?;
                    self.emit(SessionEvent::ReadingFragment { text });
                    Ok(())
                })
                .await?
            }
            Err(e) => StreamOutcome::Failed(e),
        };

        let outcome = match outcome {
            StreamOutcome::Completed if self.session.reading().is_empty() => {
                StreamOutcome::Failed(BackendError::EmptyResponse)
            }
            other => other,
        };

        match outcome {
            StreamOutcome::Completed => {
                self.session.finish_reading()?;
                tracing::info!("[Session] Reading finished");
                self.emit(SessionEvent::ReadingFinished { interrupted: false });
            }
            StreamOutcome::Failed(reason) => {
                tracing::warn!("[Session] Reading interrupted: {}", reason);
                let before = self.session.reading().len();
                self.session.interrupt_reading()?;
                let notice = self.session.reading()[before..].to_string();
                self.emit(SessionEvent::ReadingFragment { text: notice });
                self.emit(SessionEvent::ReadingFinished { interrupted: true });
            }
        }
        Ok(())
    }

    // ============================================================================
    // Follow-up chat
    // ============================================================================

    /// Sends a follow-up message and streams the reply into the transcript.
    ///
    /// Only accepted once the reading has finished and no other reply is in
    /// flight. A failed reply leaves the notice in the assistant turn.
    pub async fn send_follow_up(&mut self, message: &str) -> Result<()> {
        let prior = self.session.begin_follow_up(message)?;
        self.emit(SessionEvent::ReplyStarted {
            message: message.to_string(),
        });

        let context = ReadingContext {
            question: self.session.question().to_string(),
            spread: self.active_spread("send_follow_up")?,
            cards: self.session.drawn_cards().to_vec(),
            reading: self.session.reading().to_string(),
        };

        let opened = self
            .ports
            .follow_up
            .continue_chat(&prior, message, &context, self.models.model_for(self.tier))
            .await;

        let outcome = match opened {
            Ok(stream) => {
                let idle = self.settings.stream_idle_timeout();
                consume(stream, idle, |text| {
                    self.session.append_reply(&text)?;
                    self.emit(SessionEvent::ReplyFragment { text });
                    Ok(())
                })
                .await?
            }
            Err(e) => StreamOutcome::Failed(e),
        };

        let reply_len = self.trailing_reply_len();
        let failed = match outcome {
            StreamOutcome::Completed if reply_len > 0 => {
                self.session.finish_reply()?;
                false
            }
            StreamOutcome::Completed => {
                tracing::warn!("[Session] Follow-up reply was empty");
                self.session.fail_reply()?;
                true
            }
            StreamOutcome::Failed(reason) => {
                tracing::warn!("[Session] Follow-up reply failed: {}", reason);
                self.session.fail_reply()?;
                true
            }
        };

        if failed {
            let tail = self
                .session
                .chat_history()
                .last()
                .map(|turn| turn.text[reply_len..].to_string())
                .unwrap_or_default();
            self.emit(SessionEvent::ReplyFragment { text: tail });
        }
        self.emit(SessionEvent::ReplyFinished { failed });
        Ok(())
    }

    // ============================================================================
    // Reset
    // ============================================================================

    /// Clears the session back to `Input`. Allowed from any phase.
    pub fn reset(&mut self) {
        self.session.reset();
        tracing::info!("[Session] Reset");
        self.emit(SessionEvent::Reset);
        self.emit_phase();
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn active_spread(&self, operation: &'static str) -> Result<Spread> {
        self.session
            .spread()
            .cloned()
            .ok_or_else(|| TarotError::invalid_phase(operation, self.session.phase()))
    }

    fn trailing_reply_len(&self) -> usize {
        self.session
            .chat_history()
            .last()
            .map(|turn| turn.text.len())
            .unwrap_or(0)
    }

    fn emit_phase(&self) {
        self.emit(SessionEvent::PhaseChanged {
            phase: self.session.phase(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sender) = &self.events {
            if sender.send(event).is_err() {
                tracing::debug!("[Session] Event receiver dropped");
            }
        }
    }
}

/// Feeds every fragment to `apply` until the stream ends, fails or stays
/// silent for longer than `idle`.
///
/// Errors returned by `apply` are session errors and abort consumption.
async fn consume<F>(mut stream: TextStream, idle: Duration, mut apply: F) -> Result<StreamOutcome>
where
    F: FnMut(String) -> Result<()>,
{
    loop {
        match tokio::time::timeout(idle, stream.next()).await {
            Ok(Some(Ok(text))) => {
                if !text.is_empty() {
                    apply(text)?;
                }
            }
            Ok(Some(Err(e))) => return Ok(StreamOutcome::Failed(e)),
            Ok(None) => return Ok(StreamOutcome::Completed),
            Err(_) => return Ok(StreamOutcome::Failed(BackendError::Timeout(idle))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn fragments(parts: &[&str]) -> Vec<std::result::Result<String, BackendError>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    #[tokio::test]
    async fn test_consume_applies_fragments_in_order() {
        let stream = stream::iter(fragments(&["a", "", "b"])).boxed();
        let mut seen = Vec::new();

        let outcome = consume(stream, Duration::from_secs(1), |text| {
            seen.push(text);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consume_reports_idle_timeout() {
        let idle = Duration::from_secs(5);
        let stream = stream::iter(fragments(&["a"]))
            .chain(stream::pending())
            .boxed();
        let mut seen = Vec::new();

        let outcome = consume(stream, idle, |text| {
            seen.push(text);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(outcome, StreamOutcome::Failed(BackendError::Timeout(idle)));
        assert_eq!(seen, vec!["a"]);
    }

    #[tokio::test]
    async fn test_consume_stops_at_first_error() {
        let mut items = fragments(&["a"]);
        items.push(Err(BackendError::Stream("reset".into())));
        items.extend(fragments(&["never"]));
        let mut seen = Vec::new();

        let outcome = consume(stream::iter(items).boxed(), Duration::from_secs(1), |text| {
            seen.push(text);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(
            outcome,
            StreamOutcome::Failed(BackendError::Stream("reset".into()))
        );
        assert_eq!(seen, vec!["a"]);
    }
}
