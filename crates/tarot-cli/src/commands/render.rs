//! Terminal rendering of session events.

use colored::Colorize;
use std::io::Write;
use tarot_core::deck::find_spread;
use tarot_core::image::suit_icon;
use tarot_core::session::{Phase, SessionEvent};
use tarot_core::spread::Spread;

/// Turns streamed HTML fragments into plain terminal text.
///
/// Tags and entities may be split across fragments, so the filter keeps
/// the unfinished part between calls. Block-closing tags become line
/// breaks and `<li>` becomes a bullet. A `<` that is not followed by a
/// letter or `/` is ordinary text.
#[derive(Debug, Default)]
pub struct HtmlText {
    state: Markup,
}

#[derive(Debug, Default)]
enum Markup {
    #[default]
    Text,
    /// Saw `<`, waiting for the next char to decide.
    Open,
    Tag(String),
    Entity(String),
}

const MAX_ENTITY_LEN: usize = 8;

impl HtmlText {
    pub fn push(&mut self, fragment: &str) -> String {
        let mut out = String::new();
        for ch in fragment.chars() {
            self.feed(ch, &mut out);
        }
        out
    }

    fn feed(&mut self, ch: char, out: &mut String) {
        match std::mem::take(&mut self.state) {
            Markup::Text => match ch {
                '<' => self.state = Markup::Open,
                '&' => self.state = Markup::Entity(String::new()),
                _ => out.push(ch),
            },
            Markup::Open => {
                if ch.is_ascii_alphabetic() || ch == '/' || ch == '!' {
                    self.state = Markup::Tag(ch.to_string());
                } else {
                    out.push('<');
                    self.feed(ch, out);
                }
            }
            Markup::Tag(mut tag) => {
                if ch == '>' {
                    out.push_str(tag_text(&tag));
                } else {
                    tag.push(ch);
                    self.state = Markup::Tag(tag);
                }
            }
            Markup::Entity(mut name) => {
                if ch == ';' {
                    match decode_entity(&name) {
                        Some(decoded) => out.push(decoded),
                        None => {
                            out.push('&');
                            out.push_str(&name);
                            out.push(';');
                        }
                    }
                } else if (ch.is_ascii_alphanumeric() || ch == '#') && name.len() < MAX_ENTITY_LEN {
                    name.push(ch);
                    self.state = Markup::Entity(name);
                } else {
                    out.push('&');
                    out.push_str(&name);
                    self.feed(ch, out);
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = Markup::Text;
    }
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn tag_text(tag: &str) -> &'static str {
    let name = tag
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let closing = tag.starts_with('/');

    match (name.as_str(), closing) {
        ("li", false) => "  • ",
        ("h3" | "p" | "li" | "ul", true) => "\n",
        ("br", _) => "\n",
        _ => "",
    }
}

/// Prints events as they arrive.
#[derive(Default)]
pub struct EventPrinter {
    html: HtmlText,
    spread: Option<Spread>,
}

impl EventPrinter {
    pub fn print(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PhaseChanged { phase } => match phase {
                Phase::AnalyzingIntent => println!("{}", "正在解析你的问题...".bright_black()),
                Phase::Shuffling => println!("{}", "正在连接量子随机源并洗牌...".bright_black()),
                Phase::Reading => {
                    self.html.reset();
                    println!("\n{}\n", "── 解读 ──".bright_magenta().bold());
                }
                Phase::Input | Phase::Drawing => {}
            },
            SessionEvent::SpreadSelected {
                spread_id,
                automatic,
            } => {
                self.spread = find_spread(&spread_id).cloned();
                let name = self
                    .spread
                    .as_ref()
                    .map(|s| s.name.clone())
                    .unwrap_or(spread_id);
                let how = if automatic { "(AI 选择)" } else { "" };
                println!("{} {} {}", "牌阵:".bright_cyan(), name.bold(), how.bright_black());
            }
            SessionEvent::DeckShuffled { entropy_values } => {
                println!(
                    "{}",
                    format!("洗牌完成 ({} 个熵值)", entropy_values).bright_black()
                );
            }
            SessionEvent::CardDrawn { card } => {
                let position = self
                    .spread
                    .as_ref()
                    .and_then(|s| s.position(card.spread_position_index))
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                println!(
                    "{} {} {} {} {}",
                    format!("[{}. {}]", card.spread_position_index + 1, position).yellow(),
                    suit_icon(&card.card),
                    card.card.name.bright_magenta().bold(),
                    format!("({})", card.card.english_name).bright_black(),
                    card.orientation().label()
                );
            }
            SessionEvent::ReadingFragment { text } => {
                print_inline(&self.html.push(&text));
            }
            SessionEvent::ReadingFinished { interrupted } => {
                println!();
                if interrupted {
                    println!("{}", "解读未能完整生成。".yellow());
                }
            }
            SessionEvent::ReplyStarted { .. } => {}
            SessionEvent::ReplyFragment { text } => print_inline(&text.bright_blue().to_string()),
            SessionEvent::ReplyFinished { .. } => println!("\n"),
            SessionEvent::Aborted { note } => println!("{}", note.red()),
            SessionEvent::Reset => {
                self.spread = None;
                println!("{}", "已重置。".bright_green());
            }
        }
    }
}

fn print_inline(text: &str) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", text);
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_text_handles_tags_split_across_fragments() {
        let mut html = HtmlText::default();
        let mut out = String::new();
        for fragment in ["<h3>开场</h", "3><p>The <str", "ong>Fool</strong></p><ul class=\"list-disc pl-5\"><li>走", "</li></ul>"] {
            out.push_str(&html.push(fragment));
        }
        assert_eq!(out, "开场\nThe Fool\n  • 走\n\n");
    }

    #[test]
    fn test_html_text_keeps_bare_angle_brackets() {
        let mut html = HtmlText::default();
        let mut out = String::new();
        for fragment in ["<p>a <", " b and 3<5", "</p>"] {
            out.push_str(&html.push(fragment));
        }
        assert_eq!(out, "a < b and 3<5\n");
    }

    #[test]
    fn test_html_text_decodes_entities() {
        let mut html = HtmlText::default();
        let mut out = String::new();
        for fragment in ["Cups &am", "p; Wands &lt;3 &#39;ok&#x27; R&D", " &bogus;"] {
            out.push_str(&html.push(fragment));
        }
        assert_eq!(out, "Cups & Wands <3 'ok' R&D &bogus;");
    }
}
