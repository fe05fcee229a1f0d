//! Rasterizer backed by poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use image::DynamicImage;
use tracing::debug;

use super::{PdfExtractor, Rasterizer, Result};
use crate::error::PdfError;
use crate::models::label::PageRange;

/// Renders pages to PNG with `pdftoppm` in a temporary directory.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn page_count(&self, path: &Path) -> Result<u32> {
        Ok(PdfExtractor::open(path)?.page_count())
    }

    fn rasterize(&self, path: &Path, dpi: u32, range: PageRange) -> Result<Vec<DynamicImage>> {
        let start = Instant::now();
        let temp_dir = tempfile::tempdir()
            .map_err(|e| PdfError::Render(format!("failed to create temp dir: {}", e)))?;
        let prefix = temp_dir.path().join("page");

        // pdftoppm -png -r DPI -f FIRST -l LAST input.pdf prefix
        let output = Command::new(&self.binary)
            .arg("-png")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &range.first.to_string()])
            .args(["-l", &range.last.to_string()])
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|e| PdfError::Render(format!("{}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(PdfError::Render(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // Page numbers are zero padded to a common width, so name order is page order.
        let mut files: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())
            .map_err(|e| PdfError::Render(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        files.sort();

        let images = files
            .iter()
            .map(|file| {
                image::open(file)
                    .map_err(|e| PdfError::Render(format!("{}: {}", file.display(), e)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "pdftoppm rendered pages {}-{} at {} dpi into {} images in {:?}",
            range.first,
            range.last,
            dpi,
            images.len(),
            start.elapsed()
        );
        Ok(images)
    }
}
