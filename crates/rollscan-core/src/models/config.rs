//! Configuration structures for the label pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::RollscanError;
use crate::ocr::PageSegMode;

/// Main configuration for the rollscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollscanConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Label extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Recognition engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path or command name of the tesseract binary.
    pub tesseract_path: PathBuf,

    /// Tesseract language pack.
    pub language: String,

    /// Segmentation mode for the initial structured pass over a page.
    pub layout_psm: PageSegMode,

    /// Segmentation mode for the roll refinement pass (single text line).
    pub refine_psm: PageSegMode,

    /// Segmentation mode for whole-page raw text passes.
    pub page_psm: PageSegMode,

    /// Character whitelist used for roll-oriented passes.
    pub whitelist: String,

    /// Pixels added on every side of the roll line before re-reading it.
    pub refine_margin: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            layout_psm: PageSegMode::AUTO,
            refine_psm: PageSegMode::SINGLE_LINE,
            page_psm: PageSegMode::SINGLE_BLOCK,
            whitelist: crate::label::rules::ROLL_WHITELIST.to_string(),
            refine_margin: 20,
        }
    }
}

/// Which rasterizer turns PDF pages into images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterizerKind {
    /// Render with poppler's `pdftoppm`.
    #[default]
    Pdftoppm,
    /// Use the scanned image embedded in each page.
    Embedded,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Rasterizer backend.
    pub rasterizer: RasterizerKind,

    /// Path or command name of the pdftoppm binary.
    pub pdftoppm_path: PathBuf,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 200,
            rasterizer: RasterizerKind::default(),
            pdftoppm_path: PathBuf::from("pdftoppm"),
        }
    }
}

/// Label extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Drop grouped lines shorter than this fraction of the image height.
    pub min_height_ratio: f32,

    /// Drop grouped lines shorter than this fraction of the tallest line.
    pub min_relative_height: f32,

    /// Lines after the roll line searched by the plain-text fallback.
    pub fallback_window: usize,

    /// Re-read the roll line from a cropped region.
    pub refine_roll: bool,

    /// Run the whole-page plain-text fallback when a field is missing.
    pub text_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_height_ratio: 0.0,
            min_relative_height: 0.0,
            fallback_window: crate::label::rules::FALLBACK_WINDOW,
            refine_roll: true,
            text_fallback: true,
        }
    }
}

impl ExtractionConfig {
    /// Check that ratios are within `[0, 1]`.
    pub fn validate(&self) -> Result<(), RollscanError> {
        for (name, value) in [
            ("min_height_ratio", self.min_height_ratio),
            ("min_relative_height", self.min_relative_height),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RollscanError::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl RollscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, RollscanError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| RollscanError::Config(format!("{}: {}", path.display(), e)))?;
        config.extraction.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), RollscanError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RollscanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
