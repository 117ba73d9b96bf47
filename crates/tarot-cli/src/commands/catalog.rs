use anyhow::{Result, bail};
use colored::Colorize;
use tarot_core::deck::{DEFAULT_SPREAD_ID, reference_deck, spreads};
use tarot_core::image::suit_icon;
use tarot_core::{Arcana, Card, Suit};

pub fn list_spreads() {
    for spread in spreads() {
        let default_marker = if spread.id == DEFAULT_SPREAD_ID {
            " (default)".bright_black().to_string()
        } else {
            String::new()
        };
        println!(
            "{} {}{}",
            spread.id.bright_cyan().bold(),
            spread.name.bright_magenta(),
            default_marker
        );
        println!("  {}", spread.description);
        for position in &spread.positions {
            println!(
                "  {}. {} - {}",
                position.index + 1,
                position.name.yellow(),
                position.description.bright_black()
            );
        }
        println!();
    }
}

fn parse_filter(filter: &str) -> Result<Option<Suit>> {
    let suit = match filter.to_lowercase().as_str() {
        "major" => None,
        "wands" => Some(Suit::Wands),
        "cups" => Some(Suit::Cups),
        "swords" => Some(Suit::Swords),
        "pentacles" => Some(Suit::Pentacles),
        other => bail!("Unknown suit '{}': use major, wands, cups, swords or pentacles", other),
    };
    Ok(suit)
}

fn matches_filter(card: &Card, filter: Option<Option<Suit>>) -> bool {
    match filter {
        None => true,
        Some(None) => card.arcana == Arcana::Major,
        Some(Some(suit)) => card.arcana == Arcana::Minor && card.suit == suit,
    }
}

pub fn list_deck(suit: Option<&str>) -> Result<()> {
    let filter = suit.map(parse_filter).transpose()?;

    for card in reference_deck().iter().filter(|c| matches_filter(c, filter)) {
        println!(
            "{:>2} {} {} {}  {}",
            card.id,
            suit_icon(card),
            card.name.bright_magenta(),
            format!("({})", card.english_name).bright_black(),
            card.keywords.join(" · ").yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters() {
        let deck = reference_deck();
        let major = parse_filter("major").unwrap();
        let cups = parse_filter("Cups").unwrap();

        assert_eq!(deck.iter().filter(|c| matches_filter(c, Some(major))).count(), 22);
        assert_eq!(deck.iter().filter(|c| matches_filter(c, Some(cups))).count(), 14);
        assert_eq!(deck.iter().filter(|c| matches_filter(c, None)).count(), 78);
        assert!(parse_filter("coins").is_err());
    }
}
