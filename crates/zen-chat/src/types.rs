//! Shared chat types: intents, time buckets, and conversation turns.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Classification enums
// =============================================================================

/// Communicative purpose of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Farewell,
    DeepQuestion,
    Practical,
    Emotional,
    /// Default when no keyword matches.
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Farewell => "farewell",
            Intent::DeepQuestion => "deep_question",
            Intent::Practical => "practical",
            Intent::Emotional => "emotional",
            Intent::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucket of the day used to vary greetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeContext {
    /// 05:00 to 08:59.
    Morning,
    /// 09:00 to 16:59.
    Day,
    /// 17:00 to 20:59.
    Evening,
    /// 21:00 to 04:59.
    Night,
}

impl TimeContext {
    /// Bucket an hour of the day (0-23). Hours outside the range fall into `Night`.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=8 => TimeContext::Morning,
            9..=16 => TimeContext::Day,
            17..=20 => TimeContext::Evening,
            _ => TimeContext::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeContext::Morning => "morning",
            TimeContext::Day => "day",
            TimeContext::Evening => "evening",
            TimeContext::Night => "night",
        }
    }
}

impl fmt::Display for TimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucket of the year used for decorative phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Bucket a calendar month (1-12). Anything else is treated as winter.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Conversation input
// =============================================================================

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior message in the conversation, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body accepted by the chat endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Content of the most recent turn, or `""` when there are no turns.
    pub fn last_content(&self) -> &str {
        last_content(&self.messages)
    }
}

/// Content of the final turn in `turns`, or `""` when empty.
pub fn last_content(turns: &[ChatTurn]) -> &str {
    turns.last().map(|t| t.content.as_str()).unwrap_or("")
}

// =============================================================================
// Engine output
// =============================================================================

/// Result of the bounded generate-then-validate loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReply {
    /// Reply text handed to the encoder.
    pub reply: String,
    /// Intent the utterance was classified as.
    pub intent: Intent,
    /// Number of generations performed (1..=max attempts).
    pub attempts: u32,
    /// Whether the returned reply passed validation.
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_context_boundaries() {
        assert_eq!(TimeContext::from_hour(4), TimeContext::Night);
        assert_eq!(TimeContext::from_hour(5), TimeContext::Morning);
        assert_eq!(TimeContext::from_hour(8), TimeContext::Morning);
        assert_eq!(TimeContext::from_hour(9), TimeContext::Day);
        assert_eq!(TimeContext::from_hour(16), TimeContext::Day);
        assert_eq!(TimeContext::from_hour(17), TimeContext::Evening);
        assert_eq!(TimeContext::from_hour(20), TimeContext::Evening);
        assert_eq!(TimeContext::from_hour(21), TimeContext::Night);
        assert_eq!(TimeContext::from_hour(0), TimeContext::Night);
        assert_eq!(TimeContext::from_hour(23), TimeContext::Night);
    }

    #[test]
    fn test_time_context_partitions_the_day() {
        let counts = (0..24).fold([0usize; 4], |mut acc, h| {
            let idx = match TimeContext::from_hour(h) {
                TimeContext::Morning => 0,
                TimeContext::Day => 1,
                TimeContext::Evening => 2,
                TimeContext::Night => 3,
            };
            acc[idx] += 1;
            acc
        });
        assert_eq!(counts, [4, 8, 4, 8]);
    }

    #[test]
    fn test_season_boundaries() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
    }

    #[test]
    fn test_intent_serde_names() {
        assert_eq!(
            serde_json::to_string(&Intent::DeepQuestion).unwrap(),
            "\"deep_question\""
        );
        let parsed: Intent = serde_json::from_str("\"emotional\"").unwrap();
        assert_eq!(parsed, Intent::Emotional);
        assert_eq!(Intent::General.to_string(), "general");
    }

    #[test]
    fn test_chat_request_deserialize() {
        let json = r#"{"messages":[{"role":"user","content":"こんにちは"},{"role":"assistant","content":"..."},{"role":"user","content":"ありがとう"}]}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[1].role, Role::Assistant);
        assert_eq!(req.last_content(), "ありがとう");
    }

    #[test]
    fn test_chat_request_missing_messages_is_empty() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.messages.is_empty());
        assert_eq!(req.last_content(), "");
    }

    #[test]
    fn test_turn_without_content_defaults_to_empty() {
        let turn: ChatTurn = serde_json::from_str(r#"{"role":"user"}"#).unwrap();
        assert_eq!(turn, ChatTurn::user(""));
    }
}
