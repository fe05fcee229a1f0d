//! PDF page rasterization.

pub(crate) mod extractor;
#[cfg(feature = "native")]
mod pdftoppm;

pub use extractor::{EmbeddedRasterizer, PdfExtractor};
#[cfg(feature = "native")]
pub use pdftoppm::PdftoppmRasterizer;

use std::path::Path;

use image::DynamicImage;

use crate::error::PdfError;
use crate::models::label::PageRange;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns pages of a PDF into images.
pub trait Rasterizer {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Render the pages in `range`, in page order.
    fn rasterize(&self, path: &Path, dpi: u32, range: PageRange) -> Result<Vec<DynamicImage>>;
}

impl<P: Rasterizer + ?Sized> Rasterizer for &P {
    fn page_count(&self, path: &Path) -> Result<u32> {
        (**self).page_count(path)
    }

    fn rasterize(&self, path: &Path, dpi: u32, range: PageRange) -> Result<Vec<DynamicImage>> {
        (**self).rasterize(path, dpi, range)
    }
}

impl<P: Rasterizer + ?Sized> Rasterizer for Box<P> {
    fn page_count(&self, path: &Path) -> Result<u32> {
        (**self).page_count(path)
    }

    fn rasterize(&self, path: &Path, dpi: u32, range: PageRange) -> Result<Vec<DynamicImage>> {
        (**self).rasterize(path, dpi, range)
    }
}
