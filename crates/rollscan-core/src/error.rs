//! Error types for the rollscan-core library.

use thiserror::Error;

/// Main error type for the rollscan library.
///
/// A missing roll or customer is never an error; it is reported as `None`
/// inside [`PageResult`](crate::models::label::PageResult). These variants
/// cover hard failures of the rasterizer or recognition engine.
#[derive(Error, Debug)]
pub enum RollscanError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing and rasterization.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// Requested page range is empty or reversed.
    #[error("invalid page range: {first}-{last}")]
    InvalidRange { first: u32, last: u32 },

    /// Failed to extract an embedded page image.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The external rasterizer failed.
    #[error("rasterization failed: {0}")]
    Render(String),

    /// The rasterizer produced a different number of pages than requested.
    #[error("expected {expected} page images, rasterizer produced {actual}")]
    PageCountMismatch { expected: usize, actual: usize },
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition engine could not be started.
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The engine produced output that could not be interpreted.
    #[error("unexpected engine output: {0}")]
    Output(String),
}

/// Result type for the rollscan library.
pub type Result<T> = std::result::Result<T, RollscanError>;
