//! Grouping of recognized word tokens into ordered text lines.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{BoundingBox, RecognizedToken, TextLine};
use crate::models::config::ExtractionConfig;

/// Height filters applied to grouped lines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineFilter {
    /// Minimum line height as a fraction of the image height (0 disables).
    pub min_height_ratio: f32,
    /// Minimum line height as a fraction of the tallest line (0 disables).
    pub min_relative_height: f32,
}

impl LineFilter {
    pub fn new(min_height_ratio: f32) -> Self {
        Self {
            min_height_ratio,
            min_relative_height: 0.0,
        }
    }

    pub fn with_relative_height(mut self, ratio: f32) -> Self {
        self.min_relative_height = ratio;
        self
    }
}

impl From<&ExtractionConfig> for LineFilter {
    fn from(config: &ExtractionConfig) -> Self {
        Self::new(config.min_height_ratio).with_relative_height(config.min_relative_height)
    }
}

/// Per-line state while tokens are being accumulated.
struct LineAccumulator {
    words: Vec<String>,
    bbox: BoundingBox,
    confidences: Vec<f32>,
}

impl LineAccumulator {
    fn new(token: &RecognizedToken) -> Self {
        Self {
            words: Vec::new(),
            bbox: token.bbox,
            confidences: Vec::new(),
        }
    }

    fn push(&mut self, token: &RecognizedToken) {
        self.words.push(token.text.clone());
        self.confidences.push(token.confidence);
        self.bbox = self.bbox.union(&token.bbox);
    }

    fn finish(self) -> Option<TextLine> {
        let text = self.words.join(" ").trim().to_string();
        if text.is_empty() {
            return None;
        }
        let confidence = self.confidences.iter().sum::<f32>() / self.confidences.len() as f32;
        Some(TextLine {
            text,
            bbox: self.bbox,
            confidence,
        })
    }
}

/// Group tokens by their engine line index and sort the lines top to bottom.
///
/// Tokens with blank text are skipped. Lines are ordered by their top edge;
/// lines sharing a top edge keep the order in which their first token
/// appeared.
pub fn group_lines(
    tokens: &[RecognizedToken],
    image_height: u32,
    filter: &LineFilter,
) -> Vec<TextLine> {
    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut accumulators: Vec<LineAccumulator> = Vec::new();

    for token in tokens {
        if token.text.trim().is_empty() {
            continue;
        }
        trace!("token line={} {:?} {:?}", token.line, token.text, token.bbox);
        let slot = *index.entry(token.line).or_insert_with(|| {
            accumulators.push(LineAccumulator::new(token));
            accumulators.len() - 1
        });
        accumulators[slot].push(token);
    }

    let grouped = accumulators.len();
    let mut lines: Vec<TextLine> = accumulators
        .into_iter()
        .filter_map(LineAccumulator::finish)
        .filter(|line| {
            filter.min_height_ratio <= 0.0
                || line.height() as f32 >= filter.min_height_ratio * image_height as f32
        })
        .collect();

    if filter.min_relative_height > 0.0 {
        let tallest = lines.iter().map(TextLine::height).max().unwrap_or(0);
        let threshold = filter.min_relative_height * tallest as f32;
        lines.retain(|line| line.height() as f32 >= threshold);
    }

    lines.sort_by_key(TextLine::top);

    debug!(
        "Grouped {} tokens into {} lines, {} kept after height filters",
        tokens.len(),
        grouped,
        lines.len()
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(text: &str, left: u32, top: u32, width: u32, height: u32, conf: f32, line: u32) -> RecognizedToken {
        RecognizedToken::new(text, BoundingBox::new(left, top, width, height), conf, line)
    }

    #[test]
    fn test_groups_tokens_by_line_index() {
        let tokens = vec![
            token("JOHN", 10, 200, 40, 20, 90.0, 2),
            token("F609890101", 10, 100, 120, 30, 80.0, 1),
            token("SMITH", 60, 198, 50, 24, 70.0, 2),
        ];

        let lines = group_lines(&tokens, 1000, &LineFilter::default());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "F609890101");
        assert_eq!(lines[1].text, "JOHN SMITH");
        assert_eq!(lines[1].bbox, BoundingBox::new(10, 198, 100, 24));
        assert_eq!(lines[1].confidence, 80.0);
    }

    #[test]
    fn test_skips_blank_tokens() {
        let tokens = vec![
            token("  ", 0, 0, 500, 500, -1.0, 1),
            token("", 0, 0, 10, 10, -1.0, 3),
            token("ACME", 10, 50, 40, 20, 95.0, 1),
        ];

        let lines = group_lines(&tokens, 1000, &LineFilter::default());

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ACME");
        assert_eq!(lines[0].bbox, BoundingBox::new(10, 50, 40, 20));
    }

    #[test]
    fn test_sorted_by_top() {
        let tokens = vec![
            token("C", 0, 300, 10, 20, 90.0, 1),
            token("A", 0, 100, 10, 20, 90.0, 2),
            token("B", 0, 200, 10, 20, 90.0, 3),
        ];

        let lines = group_lines(&tokens, 1000, &LineFilter::default());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_height_filter_drops_small_lines() {
        let tokens = vec![
            token("noise", 0, 10, 30, 5, 40.0, 1),
            token("12345678", 0, 100, 200, 40, 90.0, 2),
        ];

        let lines = group_lines(&tokens, 1000, &LineFilter::new(0.02));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "12345678");
    }

    #[test]
    fn test_height_filter_is_monotonic() {
        let tokens: Vec<RecognizedToken> = (0..12)
            .map(|i| token("word", 0, i * 50, 20, 5 + i * 4, 90.0, i))
            .collect();

        let mut previous = group_lines(&tokens, 1000, &LineFilter::new(0.0));
        for ratio in [0.01, 0.02, 0.03, 0.04, 0.05] {
            let current = group_lines(&tokens, 1000, &LineFilter::new(ratio));
            assert!(current.len() <= previous.len());
            assert!(current.iter().all(|line| previous.contains(line)));
            previous = current;
        }
    }

    #[test]
    fn test_relative_height_filter() {
        let tokens = vec![
            token("small", 0, 10, 30, 10, 40.0, 1),
            token("TALL", 0, 100, 200, 40, 90.0, 2),
            token("Mid", 0, 200, 100, 32, 90.0, 3),
        ];

        let filter = LineFilter::default().with_relative_height(0.75);
        let lines = group_lines(&tokens, 1000, &filter);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["TALL", "Mid"]);
    }
}
