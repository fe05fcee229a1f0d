//! Core library for shipping-label OCR.
//!
//! This crate provides:
//! - Grouping of recognition tokens into ordered text lines
//! - Roll number and customer name extraction with recognition fallbacks
//! - PDF rasterization and page-by-page batch parsing

pub mod batch;
pub mod error;
pub mod label;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use batch::BatchDriver;
#[cfg(feature = "native")]
pub use batch::parse_pdf_labels;
pub use error::{OcrError, PdfError, Result, RollscanError};
pub use label::LabelParser;
pub use models::config::RollscanConfig;
pub use models::label::{FieldSource, PageRange, PageResult};
pub use ocr::{BoundingBox, PageSegMode, RecognizedToken, Recognizer, TextLine};
#[cfg(feature = "native")]
pub use ocr::TesseractCli;
pub use pdf::{EmbeddedRasterizer, PdfExtractor, Rasterizer};
#[cfg(feature = "native")]
pub use pdf::PdftoppmRasterizer;
