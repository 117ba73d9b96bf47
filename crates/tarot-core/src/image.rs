//! Card artwork lookup.
//!
//! Presentation layers try each [`ImageSource`] in order and advance an
//! [`ImageCursor`] whenever one fails to load.

use crate::card::{Card, Suit};
use serde::{Deserialize, Serialize};

pub const LOCAL_BASE_URL: &str = "/assets/cards";
pub const REMOTE_BASE_URL: &str = "https://www.sacred-texts.com/tarot/pkt/img";

/// One candidate for displaying a card face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageSource {
    Uri(String),
    /// Iconographic placeholder, always displayable.
    Icon(String),
}

/// Image file name for a card, e.g. `ar00.jpg` or `cu14.jpg`.
pub fn card_filename(card: &Card) -> String {
    let prefix = if card.is_major() {
        "ar"
    } else {
        match card.suit {
            Suit::Wands => "wa",
            Suit::Cups => "cu",
            Suit::Swords => "sw",
            Suit::Pentacles => "pe",
            Suit::None => "ar",
        }
    };
    format!("{prefix}{:02}.jpg", card.number)
}

/// Placeholder glyph for a card.
pub fn suit_icon(card: &Card) -> &'static str {
    if card.is_major() {
        return "★";
    }
    match card.suit {
        Suit::Wands => "🪄",
        Suit::Cups => "🏆",
        Suit::Swords => "⚔",
        Suit::Pentacles => "🪙",
        Suit::None => "★",
    }
}

/// Ordered display candidates: local asset, remote asset, placeholder icon.
pub fn image_candidates(card: &Card) -> Vec<ImageSource> {
    let filename = card_filename(card);
    vec![
        ImageSource::Uri(format!("{LOCAL_BASE_URL}/{filename}")),
        ImageSource::Uri(format!("{REMOTE_BASE_URL}/{filename}")),
        ImageSource::Icon(suit_icon(card).to_string()),
    ]
}

/// Position within a card's candidate list.
#[derive(Debug, Clone)]
pub struct ImageCursor {
    candidates: Vec<ImageSource>,
    position: usize,
}

impl ImageCursor {
    pub fn new(card: &Card) -> Self {
        Self {
            candidates: image_candidates(card),
            position: 0,
        }
    }

    pub fn current(&self) -> &ImageSource {
        &self.candidates[self.position]
    }

    /// Moves to the next candidate after a load failure. The final
    /// placeholder is sticky.
    pub fn advance(&mut self) -> &ImageSource {
        if self.position + 1 < self.candidates.len() {
            self.position += 1;
        }
        self.current()
    }
}
