//! Prompt templates for the three Gemini calls.
//!
//! Templates are rendered with minijinja. Template names carry no file
//! extension, so auto-escaping stays off and card names pass through as-is.

use minijinja::{Environment, context};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tarot_core::card::DrawnCard;
use tarot_core::error::BackendError;
use tarot_core::ports::ReadingContext;
use tarot_core::spread::Spread;

const INTENT_TEMPLATE: &str = r#"你是一位专业的塔罗牌占卜师。
求问者的问题: "{{ question }}"

请从下列牌阵中选出最适合回答这个问题的一个：
{% for spread in spreads -%}
- ID: {{ spread.id }}, 名称: {{ spread.name }}, 说明: {{ spread.description }}
{% endfor %}
只回复所选牌阵的 ID，不要附加任何解释或 Markdown 标记。"#;

const READING_TEMPLATE: &str = r#"你是“量子塔罗”的解读师，神秘、睿智并富有同理心。请使用简体中文回答。

求问者的问题: "{{ question }}"
牌阵: {{ spread.name }} - {{ spread.description }}

抽出的卡牌:
{% for card in cards -%}
位置 {{ card.position_number }} ({{ card.position_name }})
牌名: {{ card.name }} ({{ card.english_name }})
状态: {{ card.orientation }}
位置含义: {{ card.position_meaning }}
{% if not loop.last %}
{% endif %}
{%- endfor %}

请把所有卡牌串联成一个连贯的故事来回答问题。

输出格式:
1. 直接输出 HTML 片段，不要使用 Markdown 或代码块，不要包含 <html> 或 <body>。
2. 小标题用 <h3>，段落用 <p>，重点和牌名用 <strong>，建议用 <ul class="list-disc pl-5"> 与 <li>。

内容结构:
1. 开场白：简短而神秘，向牌阵的能量致意。
2. 逐张解读：说明每张牌在其位置上的意义。
3. 综合指引：汇总所有线索，回答问题。
4. 量子行动建议：一条切实可行的建议。"#;

const FOLLOW_UP_TEMPLATE: &str = r#"你正在扮演一位神秘的量子塔罗占卜师。

【当前占卜档案】
求问者问题: "{{ question }}"
牌阵: {{ spread_name }}
抽出的牌: {{ cards | join(", ") }}
初步解读概要: {{ reading }}... (以上为先前解读的一部分)

【任务】
求问者正在对解读结果追问。请继续以占卜师的身份回答，保持对话连贯。

【回答风格】
1. 神秘、睿智、富有同理心。
2. 紧扣牌意展开，不要脱离牌面。
3. 简洁直接，适合聊天，不要重复先前的整段解读。
4. 只输出纯文本，不要使用 HTML 标签。"#;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("intent", INTENT_TEMPLATE)
        .expect("intent template must parse");
    env.add_template("reading", READING_TEMPLATE)
        .expect("reading template must parse");
    env.add_template("follow_up", FOLLOW_UP_TEMPLATE)
        .expect("follow-up template must parse");
    env
});

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

#[derive(Serialize)]
struct CardLine<'a> {
    position_number: usize,
    position_name: &'a str,
    position_meaning: &'a str,
    name: &'a str,
    english_name: &'a str,
    orientation: &'static str,
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String, BackendError> {
    TEMPLATES
        .get_template(name)
        .and_then(|template| template.render(ctx))
        .map_err(|e| BackendError::InvalidRequest(format!("Failed to render {name} prompt: {e}")))
}

/// Removes every `<...>` tag, keeping the text between them.
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Prompt asking the model to pick one spread id.
pub fn intent_prompt(question: &str, spreads: &[Spread]) -> Result<String, BackendError> {
    render("intent", context! { question, spreads })
}

/// Prompt for the narrative reading.
pub fn reading_prompt(
    question: &str,
    spread: &Spread,
    cards: &[DrawnCard],
) -> Result<String, BackendError> {
    let lines: Vec<CardLine<'_>> = cards
        .iter()
        .map(|drawn| {
            let position = spread.position(drawn.spread_position_index);
            CardLine {
                position_number: drawn.spread_position_index + 1,
                position_name: position.map(|p| p.name.as_str()).unwrap_or_default(),
                position_meaning: position.map(|p| p.description.as_str()).unwrap_or_default(),
                name: &drawn.card.name,
                english_name: &drawn.card.english_name,
                orientation: drawn.orientation().label(),
            }
        })
        .collect();

    render(
        "reading",
        context! {
            question,
            spread => context! { name => &spread.name, description => &spread.description },
            cards => lines,
        },
    )
}

/// System instruction grounding follow-up replies in a finished reading.
pub fn follow_up_instruction(
    context: &ReadingContext,
    reading_chars: usize,
) -> Result<String, BackendError> {
    let cards: Vec<String> = context
        .cards
        .iter()
        .map(|drawn| format!("{} ({})", drawn.card.name, drawn.orientation().short_label()))
        .collect();
    let clean_reading = strip_html(&context.reading);
    let reading = truncate_chars(&clean_reading, reading_chars);

    render(
        "follow_up",
        context! {
            question => &context.question,
            spread_name => &context.spread.name,
            cards,
            reading,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_core::deck::{find_spread, reference_deck, spreads};

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<h3>开场</h3><p>The <strong>Fool</strong> walks</p>"),
            "开场The Fool walks"
        );
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("塔罗牌", 2), "塔罗");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_intent_prompt_lists_every_spread() {
        let prompt = intent_prompt("我该换工作吗？", spreads()).unwrap();
        assert!(prompt.contains("我该换工作吗？"));
        for spread in spreads() {
            assert!(prompt.contains(&format!("ID: {}", spread.id)));
        }
    }

    #[test]
    fn test_reading_prompt_describes_cards() {
        let spread = find_spread("three_card_time").unwrap();
        let deck = reference_deck();
        let cards = vec![
            DrawnCard::new(deck[0].clone(), false, 0),
            DrawnCard::new(deck[16].clone(), true, 1),
        ];

        let prompt = reading_prompt("未来如何？", spread, &cards).unwrap();
        assert!(prompt.contains(&format!("位置 1 ({})", spread.positions[0].name)));
        assert!(prompt.contains(&format!("位置 2 ({})", spread.positions[1].name)));
        assert!(prompt.contains(&deck[16].english_name));
        assert!(prompt.contains("正位 (Upright)"));
        assert!(prompt.contains("逆位 (Reversed)"));
        assert!(prompt.contains(&spread.positions[1].description));
    }

    #[test]
    fn test_follow_up_instruction_strips_and_truncates_reading() {
        let spread = find_spread("single_card").unwrap().clone();
        let deck = reference_deck();
        let context = ReadingContext {
            question: "What should I focus on?".into(),
            spread,
            cards: vec![DrawnCard::new(deck[1].clone(), true, 0)],
            reading: format!("<p>{}</p>", "星".repeat(50)),
        };

        let instruction = follow_up_instruction(&context, 10).unwrap();
        assert!(instruction.contains("What should I focus on?"));
        assert!(instruction.contains(&format!("{}...", "星".repeat(10))));
        assert!(!instruction.contains(&"星".repeat(11)));
        assert!(!instruction.contains("<p>"));
        assert!(instruction.contains(&deck[1].name));
    }
}
