//! # Sentiment Tagging
//! Lexicon-based polarity for the text signal of a feed item. Purely local:
//! it stays available even when the AI path is disabled or failing, so the
//! scoring multipliers never depend on the network.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Polarity of an item's text signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Summed lexicon score over the tokens. If a negator appears within the
    /// preceding 1..=3 tokens, the sign of that word's score is inverted.
    pub fn score_text(&self, text: &str) -> i32 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let w = tokens[i].as_str();
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));

            let base = self.word_score(w);
            if base != 0 {
                score += if negated { -base } else { base };
            }
        }

        score
    }

    /// Collapse a raw score into the polarity used by the scoring engine.
    /// Missing text is neutral.
    pub fn tag(&self, text: Option<&str>) -> Sentiment {
        let Some(text) = text else {
            return Sentiment::Neutral;
        };
        match self.score_text(text) {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

/// Tokenizing splits contractions at the apostrophe, so negated verb stems
/// ("isn't" -> `isn`) are matched directly. Ambiguous stems ("won", "can")
/// are left out.
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "without" | "cannot" | "isn" | "wasn" | "aren" | "weren"
            | "don" | "doesn" | "didn" | "couldn" | "wouldn" | "shouldn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_text_tags_positive() {
        let a = SentimentAnalyzer::new();
        assert_eq!(a.tag(Some("love this beautiful view")), Sentiment::Positive);
    }

    #[test]
    fn negation_flips_polarity() {
        let a = SentimentAnalyzer::new();
        assert!(a.score_text("not happy today") < 0);
    }

    #[test]
    fn contracted_negators_survive_tokenizing() {
        let a = SentimentAnalyzer::new();
        assert!(a.score_text("isn't happy about this") < 0);
        assert!(a.score_text("doesn't love it") < 0);
    }

    #[test]
    fn missing_or_flat_text_is_neutral() {
        let a = SentimentAnalyzer::new();
        assert_eq!(a.tag(None), Sentiment::Neutral);
        assert_eq!(a.tag(Some("posting a photo")), Sentiment::Neutral);
    }
}
