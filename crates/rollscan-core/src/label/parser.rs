//! Label parser combining line-based extraction with recognition fallbacks.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::config::{ExtractionConfig, OcrConfig, RollscanConfig};
use crate::models::label::{FieldSource, PageResult};
use crate::ocr::{group_lines, LineFilter, Recognizer, TextLine};

use super::rules::{clean_customer_text, find_customer_below, find_roll, find_roll_candidate};

/// Extracts the roll number and customer from one label page.
///
/// Each page goes through up to four recognition passes, strictly in order:
///
/// 1. a structured pass whose tokens are grouped into lines;
/// 2. a whitelisted re-read of the roll line, cropped with a margin;
/// 3. a whitelisted whole-page read when no line held a roll;
/// 4. an unrestricted whole-page read when a field is still missing.
///
/// Later passes only fill fields that are still empty, with one exception:
/// a successful re-read of the roll line replaces the line's own reading.
pub struct LabelParser<R> {
    recognizer: R,
    ocr: OcrConfig,
    extraction: ExtractionConfig,
}

impl<R: Recognizer> LabelParser<R> {
    /// Create a parser with default settings.
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            ocr: OcrConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }

    /// Create a parser from a full configuration.
    pub fn from_config(recognizer: R, config: &RollscanConfig) -> Self {
        Self {
            recognizer,
            ocr: config.ocr.clone(),
            extraction: config.extraction.clone(),
        }
    }

    /// Set the minimum line height as a fraction of the page height.
    pub fn with_min_height_ratio(mut self, ratio: f32) -> Self {
        self.extraction.min_height_ratio = ratio;
        self
    }

    /// Enable or disable the roll line re-read.
    pub fn with_refinement(mut self, enabled: bool) -> Self {
        self.extraction.refine_roll = enabled;
        self
    }

    /// Enable or disable the whole-page plain-text fallback.
    pub fn with_text_fallback(mut self, enabled: bool) -> Self {
        self.extraction.text_fallback = enabled;
        self
    }

    /// Set how many lines after the roll the plain-text fallback searches.
    pub fn with_fallback_window(mut self, window: usize) -> Self {
        self.extraction.fallback_window = window;
        self
    }

    /// Run the structured pass and group its tokens into ordered lines.
    pub fn read_lines(&self, image: &DynamicImage) -> Result<Vec<TextLine>> {
        let tokens = self
            .recognizer
            .recognize_tokens(image, self.ocr.layout_psm, None)?;
        Ok(group_lines(
            &tokens,
            image.height(),
            &LineFilter::from(&self.extraction),
        ))
    }

    /// Parse a page image.
    pub fn parse_image(&self, image: &DynamicImage) -> Result<PageResult> {
        let start = Instant::now();
        let lines = self.read_lines(image)?;
        let result = self.parse_lines(&lines, Some(image))?;
        info!(
            "Parsed label: roll={:?} customer={:?} in {:?}",
            result.roll,
            result.customer,
            start.elapsed()
        );
        Ok(result)
    }

    /// Parse already grouped lines.
    ///
    /// Without an image only the line-based rules run.
    pub fn parse_lines(&self, lines: &[TextLine], image: Option<&DynamicImage>) -> Result<PageResult> {
        let mut result = PageResult::default();

        let roll_line = lines
            .iter()
            .find_map(|line| find_roll(&line.text).map(|roll| (line, roll)));

        if let Some((line, roll)) = &roll_line {
            debug!("Roll {} on line {:?} at y={}", roll, line.text, line.top());
            result.set_roll(roll.clone(), FieldSource::Line);
            if let Some(image) = image.filter(|_| self.extraction.refine_roll) {
                if let Some(refined) = self.refine_roll(image, line)? {
                    result.set_roll(refined, FieldSource::Refined);
                }
            }
        } else if let Some(image) = image {
            let text = self.recognizer.recognize_text(
                image,
                self.ocr.page_psm,
                Some(self.ocr.whitelist.as_str()),
            )?;
            if let Some(roll) = find_roll(&text) {
                debug!("Roll {} from whitelisted page scan", roll);
                result.set_roll(roll, FieldSource::PageScan);
            }
        } else {
            debug!("No roll line among {} lines", lines.len());
        }

        if let Some((line, _)) = roll_line {
            if let Some(customer) = find_customer_below(lines, line) {
                result.set_customer(customer, FieldSource::Line);
            }
        }

        if !result.is_complete() && self.extraction.text_fallback {
            if let Some(image) = image {
                self.fill_from_text(image, &mut result)?;
            }
        }

        Ok(result)
    }

    /// Re-read the roll line from a larger, whitelisted crop.
    fn refine_roll(&self, image: &DynamicImage, line: &TextLine) -> Result<Option<String>> {
        let region = line
            .bbox
            .expand_within(self.ocr.refine_margin, image.dimensions());
        if region.width == 0 || region.height == 0 {
            return Ok(None);
        }

        let crop = image.crop_imm(region.left, region.top, region.width, region.height);
        let text = self.recognizer.recognize_text(
            &crop,
            self.ocr.refine_psm,
            Some(self.ocr.whitelist.as_str()),
        )?;
        let refined = find_roll_candidate(&text);
        debug!("Refined roll read {:?} -> {:?}", text.trim(), refined);
        Ok(refined)
    }

    fn fill_from_text(&self, image: &DynamicImage, result: &mut PageResult) -> Result<()> {
        let text = self
            .recognizer
            .recognize_text(image, self.ocr.page_psm, None)?;
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let (roll, customer) = parse_text_lines(&lines, self.extraction.fallback_window);
        debug!("Text fallback over {} lines: roll={:?} customer={:?}", lines.len(), roll, customer);

        if let Some(roll) = roll.filter(|_| result.roll.is_none()) {
            result.set_roll(roll, FieldSource::TextFallback);
        }
        if let Some(customer) = customer.filter(|_| result.customer.is_none()) {
            result.set_customer(customer, FieldSource::TextFallback);
        }
        Ok(())
    }
}

/// Parse roll and customer from plain text lines.
///
/// The roll is the first roll-shaped run in any line; the customer is the
/// first of the next `window` lines that cleans to a non-empty name.
pub fn parse_text_lines(lines: &[&str], window: usize) -> (Option<String>, Option<String>) {
    let Some((idx, roll)) = lines
        .iter()
        .enumerate()
        .find_map(|(idx, line)| find_roll_candidate(line).map(|roll| (idx, roll)))
    else {
        return (None, None);
    };

    let customer = lines
        .iter()
        .skip(idx + 1)
        .take(window)
        .map(|line| clean_customer_text(line))
        .find(|name| !name.is_empty());

    (Some(roll), customer)
}
