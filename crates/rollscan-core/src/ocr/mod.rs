//! Recognition engine boundary and text line grouping.

mod lines;
#[cfg(feature = "native")]
mod tesseract;

pub use lines::{group_lines, LineFilter};
#[cfg(feature = "native")]
pub use tesseract::{parse_tsv, TesseractCli};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(left, top, right - left, bottom - top)
    }

    /// Grow by `margin` on every side, clamped to a `(width, height)` canvas.
    pub fn expand_within(&self, margin: u32, bounds: (u32, u32)) -> BoundingBox {
        let left = self.left.saturating_sub(margin);
        let top = self.top.saturating_sub(margin);
        let right = self.right().saturating_add(margin).min(bounds.0);
        let bottom = self.bottom().saturating_add(margin).min(bounds.1);
        BoundingBox::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }
}

/// One word-level unit returned by the recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedToken {
    /// Recognized text.
    pub text: String,
    /// Word bounding box.
    pub bbox: BoundingBox,
    /// Engine-native confidence score.
    pub confidence: f32,
    /// Line index assigned by the engine.
    pub line: u32,
}

impl RecognizedToken {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32, line: u32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
            line,
        }
    }
}

/// Tokens grouped into one line of text.
///
/// `text` is never empty and `bbox` covers every constituent token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Space-joined token text.
    pub text: String,
    /// Union of the token boxes.
    pub bbox: BoundingBox,
    /// Mean token confidence.
    pub confidence: f32,
}

impl TextLine {
    pub fn top(&self) -> u32 {
        self.bbox.top
    }

    pub fn height(&self) -> u32 {
        self.bbox.height
    }
}

/// Opaque page segmentation mode passed through to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSegMode(pub u8);

impl PageSegMode {
    /// Fully automatic page segmentation.
    pub const AUTO: PageSegMode = PageSegMode(3);
    /// A single uniform block of text.
    pub const SINGLE_BLOCK: PageSegMode = PageSegMode(6);
    /// A single text line.
    pub const SINGLE_LINE: PageSegMode = PageSegMode(7);
}

impl std::fmt::Display for PageSegMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text recognition engine.
///
/// Implementations are called several times per page: a structured pass for
/// line grouping, then optional raw-text passes over a crop or the whole
/// page. A `whitelist` restricts the output alphabet.
pub trait Recognizer {
    /// Recognize word tokens with their boxes and line indices.
    fn recognize_tokens(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
    ) -> Result<Vec<RecognizedToken>>;

    /// Recognize plain text, lines separated by newlines.
    fn recognize_text(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
    ) -> Result<String>;
}

impl<R: Recognizer + ?Sized> Recognizer for &R {
    fn recognize_tokens(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
    ) -> Result<Vec<RecognizedToken>> {
        (**self).recognize_tokens(image, mode, whitelist)
    }

    fn recognize_text(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
    ) -> Result<String> {
        (**self).recognize_text(image, mode, whitelist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_union() {
        let a = BoundingBox::new(10, 20, 30, 10);
        let b = BoundingBox::new(50, 15, 20, 20);
        assert_eq!(a.union(&b), BoundingBox::new(10, 15, 60, 20));
    }

    #[test]
    fn test_bbox_edges_saturate_on_huge_values() {
        let huge = BoundingBox::new(u32::MAX - 5, 10, 100, u32::MAX);
        assert_eq!(huge.right(), u32::MAX);
        assert_eq!(huge.bottom(), u32::MAX);

        let merged = huge.union(&BoundingBox::new(0, 0, 10, 10));
        assert_eq!(merged, BoundingBox::new(0, 0, u32::MAX, u32::MAX));

        let crop = huge.expand_within(20, (400, 600));
        assert_eq!(crop, BoundingBox::new(u32::MAX - 25, 0, 0, 600));
    }

    #[test]
    fn test_bbox_expand_clamps_to_canvas() {
        let line = BoundingBox::new(5, 100, 200, 30);
        let crop = line.expand_within(20, (215, 1000));
        assert_eq!(crop, BoundingBox::new(0, 80, 215, 70));
    }
}
