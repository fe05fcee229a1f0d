//! Multi-page label documents.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use tracing::{info, warn};

use crate::error::{PdfError, Result};
use crate::label::LabelParser;
use crate::models::label::{PageRange, PageResult};
use crate::ocr::Recognizer;
use crate::pdf::Rasterizer;

/// Default rendering resolution for label pages.
pub const DEFAULT_DPI: u32 = 200;

/// Rasterizes a document and parses each page in order.
///
/// Pages share nothing; the result for page `n` depends only on page `n`'s
/// image.
pub struct BatchDriver<R, P> {
    parser: LabelParser<R>,
    rasterizer: P,
    dpi: u32,
}

impl<R: Recognizer, P: Rasterizer> BatchDriver<R, P> {
    pub fn new(parser: LabelParser<R>, rasterizer: P) -> Self {
        Self {
            parser,
            rasterizer,
            dpi: DEFAULT_DPI,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// The requested range, or every page when none is given.
    pub fn resolve_range(&self, path: &Path, pages: Option<PageRange>) -> Result<PageRange> {
        let count = self.rasterizer.page_count(path)?;
        if count == 0 {
            return Err(PdfError::NoPages.into());
        }
        match pages {
            Some(range) if range.last > count => Err(PdfError::InvalidPage(range.last).into()),
            Some(range) => Ok(range),
            None => Ok(PageRange::new(1, count)?),
        }
    }

    /// Render a range, checking that exactly one image came back per page.
    pub fn rasterize(&self, path: &Path, range: PageRange) -> Result<Vec<DynamicImage>> {
        let images = self.rasterizer.rasterize(path, self.dpi, range)?;
        if images.len() != range.len() {
            warn!(
                "Requested pages {}-{} but got {} images",
                range.first,
                range.last,
                images.len()
            );
            return Err(PdfError::PageCountMismatch {
                expected: range.len(),
                actual: images.len(),
            }
            .into());
        }
        Ok(images)
    }

    /// Parse already rendered pages, numbering them from `first_page`.
    pub fn parse_pages(&self, images: &[DynamicImage], first_page: u32) -> Result<Vec<PageResult>> {
        images
            .iter()
            .zip(first_page..)
            .map(|(image, page)| {
                let mut result = self.parser.parse_image(image)?;
                result.page = page;
                Ok(result)
            })
            .collect()
    }

    /// Parse a document, one result per requested page, in page order.
    pub fn parse_document(&self, path: &Path, pages: Option<PageRange>) -> Result<Vec<PageResult>> {
        let start = Instant::now();
        let range = self.resolve_range(path, pages)?;
        let images = self.rasterize(path, range)?;
        let results = self.parse_pages(&images, range.first)?;

        info!(
            "Parsed {} pages of {} ({} complete) in {:?}",
            results.len(),
            path.display(),
            results.iter().filter(|r| r.is_complete()).count(),
            start.elapsed()
        );
        Ok(results)
    }
}

/// Parse a label PDF with tesseract and pdftoppm at their default locations.
#[cfg(feature = "native")]
pub fn parse_pdf_labels(
    path: &Path,
    pages: Option<PageRange>,
    min_height_ratio: f32,
) -> Result<Vec<PageResult>> {
    let parser = LabelParser::new(crate::ocr::TesseractCli::new("tesseract"))
        .with_min_height_ratio(min_height_ratio);
    BatchDriver::new(parser, crate::pdf::PdftoppmRasterizer::default()).parse_document(path, pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use image::GrayImage;
    use pretty_assertions::assert_eq;

    use crate::error::RollscanError;
    use crate::ocr::{BoundingBox, PageSegMode, RecognizedToken};

    /// Reads the page number back from the first pixel of each image.
    struct PageNumberRecognizer;

    impl Recognizer for PageNumberRecognizer {
        fn recognize_tokens(
            &self,
            image: &DynamicImage,
            _mode: PageSegMode,
            _whitelist: Option<&str>,
        ) -> crate::ocr::Result<Vec<RecognizedToken>> {
            let page = image.to_luma8().get_pixel(0, 0).0[0];
            if page % 3 == 0 {
                return Ok(Vec::new());
            }
            Ok(vec![
                RecognizedToken::new(format!("R{:08}", page), BoundingBox::new(10, 10, 100, 20), 90.0, 1),
                RecognizedToken::new(format!("CUSTOMER{}", page), BoundingBox::new(10, 50, 100, 20), 90.0, 2),
            ])
        }

        fn recognize_text(
            &self,
            _image: &DynamicImage,
            _mode: PageSegMode,
            _whitelist: Option<&str>,
        ) -> crate::ocr::Result<String> {
            Ok(String::new())
        }
    }

    /// Produces one tiny image per page, shaded with the page number.
    struct ShadedRasterizer {
        pages: u32,
        drop_last: bool,
        calls: Cell<u32>,
    }

    impl ShadedRasterizer {
        fn new(pages: u32) -> Self {
            Self {
                pages,
                drop_last: false,
                calls: Cell::new(0),
            }
        }
    }

    impl Rasterizer for ShadedRasterizer {
        fn page_count(&self, _path: &Path) -> crate::pdf::Result<u32> {
            Ok(self.pages)
        }

        fn rasterize(&self, _path: &Path, dpi: u32, range: PageRange) -> crate::pdf::Result<Vec<DynamicImage>> {
            assert_eq!(dpi, DEFAULT_DPI);
            self.calls.set(self.calls.get() + 1);
            let mut images: Vec<DynamicImage> = range
                .pages()
                .map(|page| DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 100, image::Luma([page as u8]))))
                .collect();
            if self.drop_last {
                images.pop();
            }
            Ok(images)
        }
    }

    fn driver(rasterizer: ShadedRasterizer) -> BatchDriver<PageNumberRecognizer, ShadedRasterizer> {
        BatchDriver::new(LabelParser::new(PageNumberRecognizer), rasterizer)
    }

    #[test]
    fn test_results_follow_requested_pages() {
        let driver = driver(ShadedRasterizer::new(10));
        let range = PageRange::new(2, 4).unwrap();

        let results = driver.parse_document(Path::new("labels.pdf"), Some(range)).unwrap();

        assert_eq!(results.len(), 3);
        let pages: Vec<u32> = results.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![2, 3, 4]);
        assert_eq!(results[0].pair(), (Some("00000002"), Some("CUSTOMER2")));
        assert_eq!(results[1].pair(), (None, None));
        assert_eq!(results[2].pair(), (Some("00000004"), Some("CUSTOMER4")));
    }

    #[test]
    fn test_all_pages_when_no_range() {
        let driver = driver(ShadedRasterizer::new(7));

        let results = driver.parse_document(Path::new("labels.pdf"), None).unwrap();

        assert_eq!(results.len(), 7);
        assert_eq!(results[6].page, 7);
    }

    #[test]
    fn test_single_page_range() {
        let driver = driver(ShadedRasterizer::new(20));
        let results = driver
            .parse_document(Path::new("labels.pdf"), Some(PageRange::single(18).unwrap()))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].page, 18);
        assert_eq!(results[0].pair(), (None, None));
    }

    #[test]
    fn test_range_past_end_is_rejected() {
        let driver = driver(ShadedRasterizer::new(3));
        let err = driver
            .parse_document(Path::new("labels.pdf"), Some(PageRange::new(2, 5).unwrap()))
            .unwrap_err();
        assert!(matches!(err, RollscanError::Pdf(PdfError::InvalidPage(5))));
        assert_eq!(driver.rasterizer.calls.get(), 0);
    }

    #[test]
    fn test_short_rasterizer_output_is_rejected() {
        let mut rasterizer = ShadedRasterizer::new(5);
        rasterizer.drop_last = true;
        let driver = driver(rasterizer);

        let err = driver.parse_document(Path::new("labels.pdf"), None).unwrap_err();
        assert!(matches!(
            err,
            RollscanError::Pdf(PdfError::PageCountMismatch { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn test_parse_pages_numbers_from_first_page() {
        let driver = driver(ShadedRasterizer::new(10));
        let images = driver
            .rasterize(Path::new("labels.pdf"), PageRange::new(4, 5).unwrap())
            .unwrap();

        let results = driver.parse_pages(&images, 4).unwrap();
        let pages: Vec<u32> = results.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![4, 5]);
        assert_eq!(results[1].pair(), (Some("00000005"), Some("CUSTOMER5")));

        // A single page parsed on its own keeps its document page number.
        let single = driver.parse_pages(std::slice::from_ref(&images[1]), 5).unwrap();
        assert_eq!(single, vec![results[1].clone()]);
    }

    #[test]
    fn test_embedded_rasterizer_end_to_end() {
        let pdf = crate::pdf::extractor::tests::gray_pdf(&[(50, 40, 1), (50, 40, 2), (50, 40, 3)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.pdf");
        std::fs::write(&path, pdf).unwrap();

        let driver = BatchDriver::new(LabelParser::new(PageNumberRecognizer), crate::pdf::EmbeddedRasterizer);
        let results = driver.parse_document(&path, Some(PageRange::new(1, 2).unwrap())).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].pair(), (Some("00000002"), Some("CUSTOMER2")));
    }
}
