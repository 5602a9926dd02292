//! Rule-based response engine.
//!
//! Classifies an utterance by keyword containment, selects a template for
//! the intent (greetings vary by time of day), optionally decorates it
//! with a seasonal phrase, and validates the result against length and
//! wording constraints.

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::Rng;

use zen_core::config::EngineConfig;

use crate::corpus;
use crate::types::{Intent, Season, TimeContext, ValidatedReply};

/// Maximum reply length in characters (Unicode scalar values).
pub const MAX_REPLY_CHARS: usize = 200;

// =============================================================================
// Randomness
// =============================================================================

/// Source of the engine's random draws.
///
/// Implemented for every [`rand::Rng`]; tests can supply a scripted source
/// to make selection deterministic.
pub trait Draw {
    /// Uniform index in `0..len`. Callers never pass `len == 0`.
    fn index(&mut self, len: usize) -> usize;
    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

impl<R: Rng> Draw for R {
    fn index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }

    fn unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

// =============================================================================
// ResponseEngine
// =============================================================================

/// Stateless reply generator; safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct ResponseEngine {
    seasonal_probability: f64,
    max_attempts: u32,
}

impl Default for ResponseEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ResponseEngine {
    /// Create an engine from configuration. The probability is clamped to
    /// `[0, 1]` and at least one attempt is always made.
    pub fn new(config: &EngineConfig) -> Self {
        let seasonal_probability = if config.seasonal_probability.is_nan() {
            0.0
        } else {
            config.seasonal_probability.clamp(0.0, 1.0)
        };
        Self {
            seasonal_probability,
            max_attempts: config.max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    // -----------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------

    /// Classify the intent of an utterance.
    ///
    /// Intents are checked in table order and the first one with any
    /// trigger contained in the utterance wins. Falls back to
    /// [`Intent::General`], including for the empty string.
    pub fn classify_intent(&self, utterance: &str) -> Intent {
        corpus::CLASSIFIED_INTENTS
            .into_iter()
            .find(|intent| {
                corpus::keywords(*intent)
                    .iter()
                    .any(|kw| utterance.contains(kw))
            })
            .unwrap_or(Intent::General)
    }

    /// Bucket the hour of `now` into a time context.
    pub fn time_context(now: &NaiveDateTime) -> TimeContext {
        TimeContext::from_hour(now.hour())
    }

    /// Bucket the month of `now` into a season.
    pub fn season(now: &NaiveDateTime) -> Season {
        Season::from_month(now.month())
    }

    // -----------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------

    /// Produce one reply for `utterance` at wall-clock time `now`.
    ///
    /// Draw order: candidate index, seasonal coin, then (only when the coin
    /// lands) fragment index.
    pub fn generate_reply<D: Draw + ?Sized>(
        &self,
        utterance: &str,
        now: &NaiveDateTime,
        draw: &mut D,
    ) -> String {
        let intent = self.classify_intent(utterance);
        self.reply_for(intent, now, draw)
    }

    fn reply_for<D: Draw + ?Sized>(
        &self,
        intent: Intent,
        now: &NaiveDateTime,
        draw: &mut D,
    ) -> String {
        let set = corpus::candidates(intent, Self::time_context(now));
        let candidate = pick(set, draw);

        if draw.unit() < self.seasonal_probability {
            let fragment = pick(corpus::seasonal_fragments(Self::season(now)), draw);
            return corpus::decorate(fragment, candidate);
        }

        candidate.to_string()
    }

    /// Check a reply against the length limit and judgmental markers.
    ///
    /// The empty string is always valid.
    pub fn validate_reply(&self, reply: &str) -> bool {
        if reply.chars().count() > MAX_REPLY_CHARS {
            return false;
        }
        !corpus::JUDGMENTAL_MARKERS
            .iter()
            .any(|marker| reply.contains(marker))
    }

    /// Generate and validate, regenerating up to the attempt budget.
    ///
    /// When every attempt fails validation the last reply is still returned
    /// with `valid == false`.
    pub fn generate_validated<D: Draw + ?Sized>(
        &self,
        utterance: &str,
        now: &NaiveDateTime,
        draw: &mut D,
    ) -> ValidatedReply {
        let intent = self.classify_intent(utterance);
        let (reply, attempts, valid) =
            self.retry_until_valid(|| self.reply_for(intent, now, draw));

        if !valid {
            tracing::warn!(
                intent = %intent,
                attempts,
                "Reply failed validation after all attempts; using last one"
            );
        }

        ValidatedReply {
            reply,
            intent,
            attempts,
            valid,
        }
    }

    fn retry_until_valid(&self, mut generate: impl FnMut() -> String) -> (String, u32, bool) {
        let mut attempts = 1;
        let mut reply = generate();
        while !self.validate_reply(&reply) {
            if attempts >= self.max_attempts {
                return (reply, attempts, false);
            }
            tracing::debug!(attempt = attempts, "Reply rejected, regenerating");
            reply = generate();
            attempts += 1;
        }
        (reply, attempts, true)
    }
}

fn pick<'a, D: Draw + ?Sized>(set: &[&'a str], draw: &mut D) -> &'a str {
    match set.len() {
        0 => "",
        len => set[draw.index(len).min(len - 1)],
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Deterministic draw source replaying fixed values.
    struct Scripted {
        indices: VecDeque<usize>,
        units: VecDeque<f64>,
    }

    impl Scripted {
        fn new(indices: &[usize], units: &[f64]) -> Self {
            Self {
                indices: indices.iter().copied().collect(),
                units: units.iter().copied().collect(),
            }
        }

        /// Always the first candidate, never seasonal.
        fn plain() -> Self {
            Self::new(&[], &[])
        }
    }

    impl Draw for Scripted {
        fn index(&mut self, _len: usize) -> usize {
            self.indices.pop_front().unwrap_or(0)
        }

        fn unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.99)
        }
    }

    fn at(month: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn engine() -> ResponseEngine {
        ResponseEngine::default()
    }

    // ---- Classification ----

    #[test]
    fn test_classify_single_intent() {
        let e = engine();
        assert_eq!(e.classify_intent("こんにちは"), Intent::Greeting);
        assert_eq!(e.classify_intent("さようなら、また明日"), Intent::Farewell);
        assert_eq!(e.classify_intent("人生とは何でしょう"), Intent::DeepQuestion);
        assert_eq!(e.classify_intent("瞑想のやり方"), Intent::Practical);
        assert_eq!(e.classify_intent("最近とても不安です"), Intent::Emotional);
    }

    #[test]
    fn test_classify_every_keyword_maps_to_its_intent() {
        let e = engine();
        for intent in corpus::CLASSIFIED_INTENTS {
            for kw in corpus::keywords(intent) {
                let hit = e.classify_intent(&format!("前置き{kw}後ろ"));
                // A keyword may also contain an earlier intent's trigger; the
                // earlier intent then wins by priority.
                let earlier = corpus::CLASSIFIED_INTENTS
                    .iter()
                    .take_while(|i| **i != intent)
                    .any(|i| corpus::keywords(*i).iter().any(|k| kw.contains(k)));
                if !earlier {
                    assert_eq!(hit, intent, "keyword {kw}");
                }
            }
        }
    }

    #[test]
    fn test_classify_priority_first_declared_wins() {
        let e = engine();
        // greeting + emotional
        assert_eq!(e.classify_intent("こんにちは、辛いです"), Intent::Greeting);
        // farewell + deep_question
        assert_eq!(e.classify_intent("なぜ、ありがとう"), Intent::Farewell);
        // deep_question + practical
        assert_eq!(e.classify_intent("生きる方法を教えて"), Intent::DeepQuestion);
        // practical + emotional
        assert_eq!(e.classify_intent("ストレスの対処方法"), Intent::Practical);
    }

    #[test]
    fn test_classify_general_fallback() {
        let e = engine();
        assert_eq!(e.classify_intent(""), Intent::General);
        assert_eq!(e.classify_intent("   "), Intent::General);
        assert_eq!(e.classify_intent("hello there"), Intent::General);
        assert_eq!(e.classify_intent("今日は晴れです"), Intent::General);
    }

    #[test]
    fn test_classify_is_substring_not_word_match() {
        let e = engine();
        assert_eq!(e.classify_intent("またたく星"), Intent::Farewell);
        assert_eq!(e.classify_intent("始めまして"), Intent::Practical);
    }

    #[test]
    fn test_classify_very_long_utterance() {
        let e = engine();
        let long = "あ".repeat(100_000) + "寂しい";
        assert_eq!(e.classify_intent(&long), Intent::Emotional);
    }

    // ---- Time and season ----

    #[test]
    fn test_time_context_boundaries() {
        assert_eq!(ResponseEngine::time_context(&at(1, 5)), TimeContext::Morning);
        assert_eq!(ResponseEngine::time_context(&at(1, 9)), TimeContext::Day);
        assert_eq!(ResponseEngine::time_context(&at(1, 17)), TimeContext::Evening);
        assert_eq!(ResponseEngine::time_context(&at(1, 21)), TimeContext::Night);
        assert_eq!(ResponseEngine::time_context(&at(1, 4)), TimeContext::Night);
    }

    #[test]
    fn test_season_boundaries() {
        assert_eq!(ResponseEngine::season(&at(3, 12)), Season::Spring);
        assert_eq!(ResponseEngine::season(&at(5, 12)), Season::Spring);
        assert_eq!(ResponseEngine::season(&at(6, 12)), Season::Summer);
        assert_eq!(ResponseEngine::season(&at(11, 12)), Season::Autumn);
        assert_eq!(ResponseEngine::season(&at(12, 12)), Season::Winter);
        assert_eq!(ResponseEngine::season(&at(2, 12)), Season::Winter);
    }

    // ---- Generation ----

    #[test]
    fn test_morning_greeting_scenario() {
        let reply = engine().generate_reply("こんにちは", &at(4, 7), &mut Scripted::plain());
        assert_eq!(
            reply,
            "朝の静けさに包まれて。\n\n今日という日に、何を見つけられるでしょうか？"
        );
    }

    #[test]
    fn test_greeting_follows_time_of_day() {
        let e = engine();
        let night = e.generate_reply("こんばんは", &at(4, 23), &mut Scripted::plain());
        assert!(night.starts_with("夜の静寂の中で。"));
        let evening = e.generate_reply("こんばんは", &at(4, 18), &mut Scripted::plain());
        assert!(evening.starts_with("夕暮れ"));
    }

    #[test]
    fn test_candidate_index_selects_template() {
        let reply = engine().generate_reply(
            "ありがとう",
            &at(4, 12),
            &mut Scripted::new(&[2], &[0.99]),
        );
        assert_eq!(reply, "この瞬間の静けさを、心に留めて。");
    }

    #[test]
    fn test_seasonal_prefix_applied_below_threshold() {
        // candidate 0, coin 0.1 < 0.3, fragment 1
        let mut draw = Scripted::new(&[0, 1], &[0.1]);
        let reply = engine().generate_reply("ありがとう", &at(4, 12), &mut draw);
        assert_eq!(reply, "桜の季節。\n\n歩む道に、心の平安がありますように。");
    }

    #[test]
    fn test_seasonal_prefix_uses_current_season() {
        let e = engine();
        let winter = e.generate_reply("", &at(1, 12), &mut Scripted::new(&[0, 0], &[0.0]));
        assert!(winter.starts_with("雪の季節。\n\n"));
        let autumn = e.generate_reply("", &at(10, 12), &mut Scripted::new(&[0, 4], &[0.0]));
        assert!(autumn.starts_with("無常の季節。\n\n"));
    }

    #[test]
    fn test_seasonal_prefix_skipped_at_threshold() {
        let reply = engine().generate_reply("", &at(7, 12), &mut Scripted::new(&[0], &[0.3]));
        assert_eq!(reply, corpus::candidates(Intent::General, TimeContext::Day)[0]);
    }

    #[test]
    fn test_zero_probability_never_decorates() {
        let e = ResponseEngine::new(&EngineConfig {
            seasonal_probability: 0.0,
            max_attempts: 3,
        });
        let reply = e.generate_reply("", &at(7, 12), &mut Scripted::new(&[0], &[0.0]));
        assert!(!reply.contains("の季節。"));
    }

    #[test]
    fn test_out_of_range_index_is_clamped() {
        let reply = engine().generate_reply("こんにちは", &at(4, 7), &mut Scripted::new(&[99], &[]));
        assert!(reply.starts_with("朝の静けさ"));
    }

    #[test]
    fn test_whitespace_utterance_yields_general_reply() {
        let e = engine();
        assert_eq!(e.classify_intent(" \t\n "), Intent::General);
        let mut rng = StdRng::seed_from_u64(11);
        let reply = e.generate_reply(" \t\n ", &at(8, 12), &mut rng);
        assert!(!reply.is_empty());
    }

    #[test]
    fn test_generate_never_empty() {
        let e = engine();
        let mut rng = StdRng::seed_from_u64(42);
        for utterance in ["", "こんにちは", "ありがとう", "なぜ", "方法", "辛い", "xyz"] {
            for hour in 0..24 {
                let reply = e.generate_reply(utterance, &at(6, hour), &mut rng);
                assert!(!reply.is_empty());
            }
        }
    }

    #[test]
    fn test_generate_reproducible_with_seed() {
        let e = engine();
        let now = at(9, 10);
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(
                e.generate_reply("辛いです", &now, &mut a),
                e.generate_reply("辛いです", &now, &mut b)
            );
        }
    }

    #[test]
    fn test_generate_reply_stays_within_corpus() {
        let e = engine();
        let now = at(12, 22);
        let mut rng = StdRng::seed_from_u64(3);
        let set = corpus::candidates(Intent::Practical, TimeContext::Night);
        for _ in 0..100 {
            let reply = e.generate_reply("教えて", &now, &mut rng);
            let body = reply.rsplit_once("の季節。\n\n").map_or(reply.as_str(), |(_, b)| b);
            assert!(set.contains(&body), "unexpected reply {reply}");
        }
    }

    // ---- Validation ----

    #[test]
    fn test_validate_empty_is_valid() {
        assert!(engine().validate_reply(""));
    }

    #[test]
    fn test_validate_length_boundary() {
        let e = engine();
        assert!(e.validate_reply(&"静".repeat(200)));
        assert!(!e.validate_reply(&"静".repeat(201)));
        assert!(e.validate_reply(&"a".repeat(200)));
        assert!(!e.validate_reply(&"a".repeat(1000)));
    }

    #[test]
    fn test_validate_rejects_judgmental_markers() {
        let e = engine();
        for marker in corpus::JUDGMENTAL_MARKERS {
            assert!(!e.validate_reply(marker));
            assert!(!e.validate_reply(&format!("あなたは{marker}です")));
        }
        assert!(e.validate_reply("風はただ吹いています。"));
    }

    #[test]
    fn test_every_template_is_valid() {
        let e = engine();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let reply = e.generate_reply("", &at(3, 12), &mut rng);
            assert!(e.validate_reply(&reply));
        }
    }

    // ---- Retry ----

    #[test]
    fn test_generate_validated_first_attempt() {
        let out = engine().generate_validated("こんにちは", &at(4, 7), &mut Scripted::plain());
        assert_eq!(out.intent, Intent::Greeting);
        assert_eq!(out.attempts, 1);
        assert!(out.valid);
        assert!(out.reply.starts_with("朝"));
    }

    #[test]
    fn test_retry_recovers_after_invalid() {
        let e = engine();
        let mut outputs = vec!["正しい道".to_string(), "静か".to_string()].into_iter();
        let (reply, attempts, valid) =
            e.retry_until_valid(|| outputs.next().unwrap_or_default());
        assert_eq!(reply, "静か");
        assert_eq!(attempts, 2);
        assert!(valid);
    }

    #[test]
    fn test_retry_exhausted_returns_last_invalid() {
        let e = engine();
        let mut n = 0;
        let (reply, attempts, valid) = e.retry_until_valid(|| {
            n += 1;
            format!("{n}: べき")
        });
        assert_eq!(attempts, 3);
        assert_eq!(n, 3);
        assert!(!valid);
        assert_eq!(reply, "3: べき");
    }

    #[test]
    fn test_max_attempts_floor_is_one() {
        let e = ResponseEngine::new(&EngineConfig {
            seasonal_probability: 0.3,
            max_attempts: 0,
        });
        assert_eq!(e.max_attempts(), 1);
        let (_, attempts, valid) = e.retry_until_valid(|| "x".repeat(300));
        assert_eq!(attempts, 1);
        assert!(!valid);
    }

    #[test]
    fn test_probability_is_clamped() {
        let e = ResponseEngine::new(&EngineConfig {
            seasonal_probability: 5.0,
            max_attempts: 3,
        });
        let reply = e.generate_reply("", &at(4, 12), &mut Scripted::new(&[0, 0], &[0.999]));
        assert!(reply.starts_with("芽吹きの季節。"));
    }
}
