//! Card domain model.
//!
//! Reference cards are immutable; a [`DrawnCard`] binds one of them to a
//! spread position and an orientation for the lifetime of a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Major or minor arcana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arcana {
    Major,
    Minor,
}

impl Arcana {
    /// Localized display label.
    pub fn label(self) -> &'static str {
        match self {
            Arcana::Major => "大阿卡纳",
            Arcana::Minor => "小阿卡纳",
        }
    }
}

/// Card suit. Trump cards have no suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Wands,
    Cups,
    Swords,
    Pentacles,
    None,
}

impl Suit {
    /// Minor suits in deck order.
    pub const MINOR: [Suit; 4] = [Suit::Wands, Suit::Cups, Suit::Swords, Suit::Pentacles];

    /// Localized display label.
    pub fn label(self) -> &'static str {
        match self {
            Suit::Wands => "权杖",
            Suit::Cups => "圣杯",
            Suit::Swords => "宝剑",
            Suit::Pentacles => "星币",
            Suit::None => "无",
        }
    }

    /// Canonical English name.
    pub fn english(self) -> &'static str {
        match self {
            Suit::Wands => "Wands",
            Suit::Cups => "Cups",
            Suit::Swords => "Swords",
            Suit::Pentacles => "Pentacles",
            Suit::None => "",
        }
    }
}

/// A tarot card from the reference deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u8,
    /// Localized name
    pub name: String,
    /// Canonical English name
    pub english_name: String,
    pub suit: Suit,
    /// Rank: 0-21 for trumps, 1-14 (Ace..King) for minor cards
    pub number: u8,
    pub arcana: Arcana,
    pub keywords: Vec<String>,
    pub description: String,
}

impl Card {
    pub fn is_major(&self) -> bool {
        self.arcana == Arcana::Major
    }
}

/// Upright or reversed orientation of a drawn card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Orientation::Reversed
        } else {
            Orientation::Upright
        }
    }

    /// Localized label with the English term in parentheses.
    pub fn label(self) -> &'static str {
        match self {
            Orientation::Upright => "正位 (Upright)",
            Orientation::Reversed => "逆位 (Reversed)",
        }
    }

    /// Short localized label.
    pub fn short_label(self) -> &'static str {
        match self {
            Orientation::Upright => "正位",
            Orientation::Reversed => "逆位",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reference card bound to a draw order and an orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    #[serde(flatten)]
    pub card: Card,
    pub is_reversed: bool,
    /// Index of the spread position this card occupies (equals draw order).
    pub spread_position_index: usize,
}

impl DrawnCard {
    pub fn new(card: Card, is_reversed: bool, spread_position_index: usize) -> Self {
        Self {
            card,
            is_reversed,
            spread_position_index,
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_reversed(self.is_reversed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card() -> Card {
        Card {
            id: 0,
            name: "愚人".into(),
            english_name: "The Fool".into(),
            suit: Suit::None,
            number: 0,
            arcana: Arcana::Major,
            keywords: vec!["新的开始".into()],
            description: "新的开始".into(),
        }
    }

    #[test]
    fn test_orientation_from_flag() {
        assert_eq!(Orientation::from_reversed(true), Orientation::Reversed);
        assert_eq!(Orientation::from_reversed(false), Orientation::Upright);
    }

    #[test]
    fn test_drawn_card_serializes_flat() {
        let drawn = DrawnCard::new(sample_card(), true, 2);
        let json = serde_json::to_value(&drawn).unwrap();
        assert_eq!(json["english_name"], "The Fool");
        assert_eq!(json["is_reversed"], true);
        assert_eq!(json["spread_position_index"], 2);
        assert_eq!(drawn.orientation(), Orientation::Reversed);
    }
}
