//! Static reference data: the 78-card deck and the known spreads.
//!
//! Both tables are built once on first access and never mutated.

use crate::card::{Arcana, Card, Suit};
use crate::spread::{Spread, SpreadPosition};
use once_cell::sync::Lazy;

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 78;

/// Spread used when classification fails or a manual id is unknown.
pub const DEFAULT_SPREAD_ID: &str = "three_card_time";

/// (name, english name, keywords, description)
const MAJOR_ARCANA: [(&str, &str, [&str; 3], &str); 22] = [
    ("愚人", "The Fool", ["新的开始", "天真", "信念"], "新的开始，乐观，对生活的信任。"),
    ("魔术师", "The Magician", ["显化", "力量", "行动"], "利用所有资源来实现愿望。"),
    ("女祭司", "The High Priestess", ["直觉", "潜意识", "神秘"], "内在知识，直觉，潜意识思维。"),
    ("皇后", "The Empress", ["丰饶", "自然", "母性"], "母性，创造力，与自然的连接。"),
    ("皇帝", "The Emperor", ["权威", "结构", "控制"], "父权形象，结构，权威，规则。"),
    ("教皇", "The Hierophant", ["传统", "从众", "道德"], "精神智慧，宗教信仰，传统规范。"),
    ("恋人", "The Lovers", ["爱", "和谐", "选择"], "爱，结合，关系，价值观的一致。"),
    ("战车", "The Chariot", ["控制", "意志力", "胜利"], "通过专注和意志克服障碍。"),
    ("力量", "Strength", ["勇气", "说服", "影响"], "内在力量，勇敢，同情心，专注。"),
    ("隐士", "The Hermit", ["探索内心", "反省", "指引"], "寻求内在真理，独处，沉思。"),
    ("命运之轮", "Wheel of Fortune", ["运气", "业力", "循环"], "改变，循环，不可避免的命运。"),
    ("正义", "Justice", ["公平", "真理", "法律"], "正义，公平，真理，因果。"),
    ("倒吊人", "The Hanged Man", ["暂停", "臣服", "新视角"], "放手，新的视角，悬置。"),
    ("死神", "Death", ["结束", "改变", "转化"], "周期的结束，新生的开始，过渡。"),
    ("节制", "Temperance", ["平衡", "适度", "耐心"], "平衡，适度，耐心，目标。"),
    ("恶魔", "The Devil", ["阴影", "束缚", "限制"], "成瘾，物质主义，束缚。"),
    ("高塔", "The Tower", ["突变", "剧变", "混乱"], "突然的改变，动荡，启示，觉醒。"),
    ("星星", "The Star", ["希望", "信念", "目标"], "希望，信念，目标，更新，灵性。"),
    ("月亮", "The Moon", ["幻觉", "恐惧", "焦虑"], "幻觉，恐惧，焦虑，潜意识，直觉。"),
    ("太阳", "The Sun", ["积极", "快乐", "温暖"], "积极，快乐，温暖，成功，活力。"),
    ("审判", "Judgement", ["审判", "重生", "召唤"], "审判，重生，内在召唤，赦免。"),
    ("世界", "The World", ["完成", "整合", "成就"], "完成，整合，成就，圆满。"),
];

const RANK_NAMES: [&str; 14] = [
    "首牌", "二", "三", "四", "五", "六", "七", "八", "九", "十", "侍从", "骑士", "王后", "国王",
];

const RANK_ENGLISH: [&str; 14] = [
    "Ace", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Page",
    "Knight", "Queen", "King",
];

static TAROT_DECK: Lazy<Vec<Card>> = Lazy::new(build_deck);

static SPREADS: Lazy<Vec<Spread>> = Lazy::new(build_spreads);

/// The full reference deck in canonical order (ids 0..78).
pub fn reference_deck() -> &'static [Card] {
    &TAROT_DECK
}

/// All known spreads.
pub fn spreads() -> &'static [Spread] {
    &SPREADS
}

/// Looks up a spread by id.
pub fn find_spread(id: &str) -> Option<&'static Spread> {
    SPREADS.iter().find(|spread| spread.id == id)
}

/// The fallback spread.
pub fn default_spread() -> &'static Spread {
    find_spread(DEFAULT_SPREAD_ID).unwrap_or(&SPREADS[0])
}

/// Looks up a spread by id, substituting the default for unknown ids.
pub fn spread_or_default(id: &str) -> &'static Spread {
    find_spread(id).unwrap_or_else(default_spread)
}

/// Whether `id` names a known spread.
pub fn is_known_spread(id: &str) -> bool {
    find_spread(id).is_some()
}

fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);

    for (id, (name, english, keywords, description)) in MAJOR_ARCANA.iter().enumerate() {
        deck.push(Card {
            id: id as u8,
            name: (*name).to_string(),
            english_name: (*english).to_string(),
            suit: Suit::None,
            number: id as u8,
            arcana: Arcana::Major,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            description: (*description).to_string(),
        });
    }

    for suit in Suit::MINOR {
        let start = deck.len();
        for rank in 0..RANK_NAMES.len() {
            let name = format!("{}{}", suit.label(), RANK_NAMES[rank]);
            deck.push(Card {
                id: (start + rank) as u8,
                english_name: format!("{} of {}", RANK_ENGLISH[rank], suit.english()),
                suit,
                number: (rank + 1) as u8,
                arcana: Arcana::Minor,
                keywords: Vec::new(),
                description: format!("{name} 代表了该元素在这个阶段的本质。"),
                name,
            });
        }
    }

    deck
}

fn position(index: usize, name: &str, description: &str, x: i8, y: i8) -> SpreadPosition {
    SpreadPosition {
        index,
        name: name.to_string(),
        description: description.to_string(),
        x,
        y,
    }
}

fn build_spreads() -> Vec<Spread> {
    vec![
        Spread {
            id: "single_card".into(),
            name: "单张占卜".into(),
            description: "针对特定问题或每日主题的快速指引。".into(),
            positions: vec![position(0, "核心指引", "关于你问题的核心信息。", 0, 0)],
        },
        Spread {
            id: "three_card_time".into(),
            name: "圣三角 (时间流)".into(),
            description: "洞察事件的过去、现在与未来。".into(),
            positions: vec![
                position(0, "过去", "过去对现状的影响。", -1, 0),
                position(1, "现在", "目前的状况。", 0, 0),
                position(2, "未来", "如果维持现状，可能的发展方向。", 1, 0),
            ],
        },
        Spread {
            id: "decision_making".into(),
            name: "二选一牌阵".into(),
            description: "比较两条不同路径的发展。".into(),
            positions: vec![
                position(0, "现状", "你现在的处境。", 0, -1),
                position(1, "选择 A", "如果你选择选项 A 会发生什么。", -1, 0),
                position(2, "选择 B", "如果你选择选项 B 会发生什么。", 1, 0),
                position(3, "建议", "帮助你做决定的核心建议。", 0, 1),
            ],
        },
        Spread {
            id: "celtic_cross_simple".into(),
            name: "凯尔特十字".into(),
            description: "深入剖析问题的全貌。".into(),
            positions: vec![
                position(0, "核心", "问题的核心。", 0, 0),
                // crosses the core card
                position(1, "阻碍/助力", "横亘在核心之上的力量。", 0, 0),
                position(2, "潜意识", "潜意识的基础或根源。", 0, 1),
                position(3, "过去", "刚刚过去的影响。", -1, 0),
                position(4, "意识", "你的目标或理想。", 0, -1),
                position(5, "未来", "即将发生的事情。", 1, 0),
            ],
        },
    ]
}
