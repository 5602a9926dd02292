//! Fixed keyword, template, and seasonal tables.
//!
//! Every table is resolved through an exhaustive `match` on the
//! [`Intent`], [`TimeContext`], or [`Season`] enums, so adding a variant
//! without its entries fails to compile.

use crate::types::{Intent, Season, TimeContext};

// =============================================================================
// Keyword table
// =============================================================================

/// Intents in classification priority order. `General` is the implicit
/// default and never appears here.
pub const CLASSIFIED_INTENTS: [Intent; 5] = [
    Intent::Greeting,
    Intent::Farewell,
    Intent::DeepQuestion,
    Intent::Practical,
    Intent::Emotional,
];

/// Substring triggers for an intent (case-sensitive, not tokenized).
pub fn keywords(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Greeting => &["こんにちは", "はじめまして", "よろしく", "おはよう", "こんばんは"],
        Intent::Farewell => &["さようなら", "ありがとう", "また", "失礼", "おやすみ"],
        Intent::DeepQuestion => &[
            "人生とは",
            "死とは",
            "愛とは",
            "意味とは",
            "幸せとは",
            "生きる",
            "なぜ",
        ],
        Intent::Practical => &["やり方", "方法", "どうすれば", "教えて", "学び", "始め", "瞑想"],
        Intent::Emotional => &[
            "辛い",
            "悲しい",
            "不安",
            "怖い",
            "寂しい",
            "ストレス",
            "疲れ",
            "痛い",
            "苦しい",
        ],
        Intent::General => &[],
    }
}

// =============================================================================
// Templates
// =============================================================================

fn greeting_templates(context: TimeContext) -> &'static [&'static str] {
    match context {
        TimeContext::Morning => {
            &["朝の静けさに包まれて。\n\n今日という日に、何を見つけられるでしょうか？"]
        }
        TimeContext::Day => &["日中の光の中で。\n\n今この瞬間に、心はどこにありますか？"],
        TimeContext::Evening => {
            &["夕暮れの穏やかさとともに。\n\n一日を振り返って、何を感じますか？"]
        }
        TimeContext::Night => &["夜の静寂の中で。\n\nその静けさに、何が宿っているでしょうか？"],
    }
}

fn flat_templates(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Greeting => greeting_templates(TimeContext::Day),
        Intent::Farewell => &[
            "歩む道に、心の平安がありますように。",
            "今日の気づきが、明日の智慧となりますように。",
            "この瞬間の静けさを、心に留めて。",
        ],
        Intent::DeepQuestion => &[
            "問いそのものが、既に答えを含んでいるかもしれません。\n\nその問いは、どこから生まれたのでしょうか？",
            "言葉で捉えようとするとき、本質は逃げていきます。\n\n言葉を超えたところに、何がありますか？",
            "川は流れることで川であり続けます。\n\nあなたは何であり続けているのでしょうか？",
            "月は指差す指ではありません。\n\n何を探しているのですか？",
        ],
        Intent::Practical => &[
            "座ってください。呼吸を観察してください。\n\nそれだけで十分です。",
            "一歩ずつ。急がず、焦らず。\n\n今できることから始めてみませんか？",
            "答えを求めるより、問いと共に座ってみてください。\n\n何が見えてきますか？",
            "手を開いてください。握りしめているものを手放して。\n\nその空いた手に、何が宿るでしょうか？",
        ],
        Intent::Emotional => &[
            "その痛みも、あなたの一部です。\n\n押し退けず、そっと寄り添ってみませんか？",
            "嵐の中でも、空は変わらず広がっています。\n\nあなたの中にも、そんな静けさがありませんか？",
            "呼吸に意識を向けてください。\n\n吸って、吐いて。今、ここにいることを感じて。",
            "雲は形を変えて流れていきます。\n\n感情もまた、同じではないでしょうか？",
        ],
        Intent::General => &[
            "風はただ吹いています。\n\nあなたは今、何を感じていますか？",
            "石は投げ込まれた池に波紋を作ります。\n\nその波紋は、やがて静まります。",
            "...。\n\n静寂の中に、すべてがあります。",
            "鳥は歌い、花は咲きます。\n\nそれぞれが、ただあるがままに。",
        ],
    }
}

/// Candidate replies for an intent at the given time of day.
///
/// Greetings are partitioned by time context and fall back to the `Day`
/// bucket when a context has no entries; other intents ignore the context.
pub fn candidates(intent: Intent, context: TimeContext) -> &'static [&'static str] {
    match intent {
        Intent::Greeting => {
            let set = greeting_templates(context);
            if set.is_empty() {
                greeting_templates(TimeContext::Day)
            } else {
                set
            }
        }
        other => flat_templates(other),
    }
}

// =============================================================================
// Seasonal lexicon
// =============================================================================

/// Decorative fragments used as an optional reply prefix.
pub fn seasonal_fragments(season: Season) -> &'static [&'static str] {
    match season {
        Season::Spring => &["芽吹き", "桜", "新緑", "そよ風", "始まり"],
        Season::Summer => &["青空", "緑陰", "清流", "蝉の声", "生命力"],
        Season::Autumn => &["紅葉", "実り", "風涼し", "月", "無常"],
        Season::Winter => &["雪", "静寂", "内なる火", "暖炉", "深淵"],
    }
}

/// Format a seasonal prefix in front of a candidate reply.
pub fn decorate(fragment: &str, candidate: &str) -> String {
    format!("{fragment}の季節。\n\n{candidate}")
}

// =============================================================================
// Validation markers and upstream instruction
// =============================================================================

/// Prescriptive or evaluative phrasing a reply must not contain.
pub const JUDGMENTAL_MARKERS: [&str; 5] = ["べき", "しなければ", "間違い", "正しい", "悪い"];

/// Tone and constraint instruction sent ahead of the conversation to the
/// upstream model.
pub const SYSTEM_PROMPT: &str = "あなたは禅の精神を体現するAIアシスタントです。

【基本原則】
1. 簡潔で本質的な応答（通常50-150文字）
2. 判断や評価を避け、気づきを促す
3. 時に問いで答える
4. 内省を促す
5. 温かみのある言葉遣い

【禅的な要素】
- 自然の例えを用いる（季節、山、川、空など）
- 二元論を超えた視点
- 「今ここ」への意識
- 執着からの解放
- あるがままを受け入れる姿勢

【避けるべきこと】
- 説教くさい長い説明
- 「〜すべき」という押し付け
- 複雑な仏教用語の多用
- 一般的な自己啓発フレーズ
- 安易な解決策の提示

相談者の心の声に寄り添い、自らの内なる智慧に気づけるよう導いてください。";
