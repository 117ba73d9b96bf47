//! Spread domain model.

use serde::{Deserialize, Serialize};

/// A single position in a spread layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPosition {
    pub index: usize,
    pub name: String,
    /// What a card placed here speaks to.
    pub description: String,
    /// Relative x coordinate (0 is center)
    pub x: i8,
    /// Relative y coordinate (0 is center)
    pub y: i8,
}

/// A named layout of card positions used to structure a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub id: String,
    pub name: String,
    pub description: String,
    pub positions: Vec<SpreadPosition>,
}

impl Spread {
    /// Number of cards this spread needs.
    pub fn card_count(&self) -> usize {
        self.positions.len()
    }

    pub fn position(&self, index: usize) -> Option<&SpreadPosition> {
        self.positions.get(index)
    }
}

/// How the spread for a new reading is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SpreadChoice {
    /// Let the intent classifier pick from the question.
    Auto,
    /// Use the given spread id; unknown ids fall back to the default spread.
    Manual(String),
}

impl SpreadChoice {
    /// Parses a user-facing selector: `auto` or a spread id.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            SpreadChoice::Auto
        } else {
            SpreadChoice::Manual(trimmed.to_string())
        }
    }
}

impl Default for SpreadChoice {
    fn default() -> Self {
        SpreadChoice::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spread_choice() {
        assert_eq!(SpreadChoice::parse("auto"), SpreadChoice::Auto);
        assert_eq!(SpreadChoice::parse(" AUTO "), SpreadChoice::Auto);
        assert_eq!(SpreadChoice::parse(""), SpreadChoice::Auto);
        assert_eq!(
            SpreadChoice::parse("single_card"),
            SpreadChoice::Manual("single_card".to_string())
        );
    }
}
