//! Embedded page image extraction using lopdf.
//!
//! Scanned label PDFs usually carry one full-page image per page. Reading
//! that image back is lossless and needs no external renderer.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{Rasterizer, Result};
use crate::error::PdfError;
use crate::models::label::PageRange;

/// A loaded PDF whose page images can be extracted.
pub struct PdfExtractor {
    document: Document,
}

impl PdfExtractor {
    /// Load a PDF from bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document })
    }

    /// Load a PDF from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::load(&data)
    }

    /// Get the number of pages in the PDF.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// All decodable images drawn on a page (1-indexed).
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(*page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                            if let Some(img) = self.decode_image(obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        trace!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    /// The largest image on a page, taken to be the page scan.
    pub fn page_image(&self, page: u32) -> Result<DynamicImage> {
        self.page_images(page)?
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| {
                PdfError::ImageExtraction(format!("page {} has no decodable image", page))
            })
    }

    fn decode_image(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

        let filter = dict.get(b"Filter").ok().and_then(|filter| match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                trace!("Decoding {}x{} JPEG image", width, height);
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping image with unsupported filter {:?}", filter);
                return None;
            }
            _ => {}
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        decode_raw(&data, width, height, color_space, bits)
    }

    /// Resources dictionary for a page, following inheritance up the page tree.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = self.document.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = self.document.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }
}

fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={:?} data_len={} pixels={}",
                String::from_utf8_lossy(color_space),
                data.len(),
                pixels
            );
            None
        }
    }
}

/// Rasterizer that returns each page's embedded scan. The dpi is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedRasterizer;

impl Rasterizer for EmbeddedRasterizer {
    fn page_count(&self, path: &Path) -> Result<u32> {
        Ok(PdfExtractor::open(path)?.page_count())
    }

    fn rasterize(&self, path: &Path, _dpi: u32, range: PageRange) -> Result<Vec<DynamicImage>> {
        let extractor = PdfExtractor::open(path)?;
        range.pages().map(|page| extractor.page_image(page)).collect()
    }
}
