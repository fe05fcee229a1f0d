//! Roll number extraction.

use super::patterns::{ROLL_CANDIDATE, ROLL_DIGITS, ROLL_PATTERN};
use super::FieldExtractor;

/// Length of a clean roll number's digit run.
const ROLL_DIGIT_LEN: usize = 8;

/// Strip a spurious leading letter from a matched roll.
///
/// A 9-character match whose digit run is exactly 8 digits is read as an
/// 8-digit roll with one letter of recognition noise in front. Everything
/// else is returned unchanged, so the function is idempotent.
pub fn normalize_roll(roll: &str) -> String {
    match ROLL_DIGITS.find(roll) {
        Some(digits) if digits.len() == ROLL_DIGIT_LEN && roll.len() == ROLL_DIGIT_LEN + 1 => {
            digits.as_str().to_string()
        }
        _ => roll.to_string(),
    }
}

/// Roll number extractor.
///
/// By default a roll must stand as a whole word. The loose variant accepts
/// the pattern anywhere, which suits whitelisted re-reads of a single line.
pub struct RollExtractor {
    whole_word: bool,
}

impl RollExtractor {
    pub fn new() -> Self {
        Self { whole_word: true }
    }

    pub fn loose() -> Self {
        Self { whole_word: false }
    }
}

impl Default for RollExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for RollExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let pattern = if self.whole_word { &*ROLL_PATTERN } else { &*ROLL_CANDIDATE };
        pattern
            .captures(text)
            .map(|caps| normalize_roll(&caps[1]))
    }
}

/// First whole-word roll in `text`, normalized.
pub fn find_roll(text: &str) -> Option<String> {
    RollExtractor::new().extract(text)
}

/// First roll-shaped run anywhere in `text`, normalized.
pub fn find_roll_candidate(text: &str) -> Option<String> {
    RollExtractor::loose().extract(text)
}
