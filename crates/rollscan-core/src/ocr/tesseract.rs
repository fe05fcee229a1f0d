//! Recognizer backed by the `tesseract` command-line tool.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, trace};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{BoundingBox, PageSegMode, RecognizedToken, Recognizer, Result};

/// Column positions in tesseract's TSV output.
const TSV_LINE_NUM: usize = 4;
const TSV_LEFT: usize = 6;
const TSV_CONF: usize = 10;
const TSV_TEXT: usize = 11;

/// Runs `tesseract` as a subprocess for every recognition call.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
}

impl TesseractCli {
    /// Use the given tesseract binary with the English language pack.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: "eng".to_string(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(&config.tesseract_path).with_language(&config.language)
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn run(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
        tsv: bool,
    ) -> Result<String> {
        let start = Instant::now();
        let temp_dir = tempfile::tempdir()
            .map_err(|e| OcrError::Recognition(format!("failed to create temp dir: {}", e)))?;
        let input = temp_dir.path().join("input.png");
        image
            .save(&input)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let mut command = Command::new(&self.binary);
        command
            .arg(&input)
            .arg("stdout")
            .args(["-l", &self.language, "--psm", &mode.to_string()]);
        if let Some(chars) = whitelist {
            command
                .arg("-c")
                .arg(format!("tessedit_char_whitelist={}", chars));
        }
        if tsv {
            command.arg("tsv");
        }

        let output = command.output().map_err(|e| {
            OcrError::EngineUnavailable(format!("{}: {}", self.binary.display(), e))
        })?;

        if !output.status.success() {
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::Output(format!("non UTF-8 output: {}", e)))?;

        debug!(
            "tesseract psm={} whitelist={} tsv={} on {}x{} in {:?}",
            mode,
            whitelist.is_some(),
            tsv,
            image.width(),
            image.height(),
            start.elapsed()
        );
        Ok(stdout)
    }
}

impl Recognizer for TesseractCli {
    fn recognize_tokens(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
    ) -> Result<Vec<RecognizedToken>> {
        let tsv = self.run(image, mode, whitelist, true)?;
        parse_tsv(&tsv)
    }

    fn recognize_text(
        &self,
        image: &DynamicImage,
        mode: PageSegMode,
        whitelist: Option<&str>,
    ) -> Result<String> {
        self.run(image, mode, whitelist, false)
    }
}

/// Parse tesseract TSV output into word tokens.
///
/// Rows without text (page, block, paragraph and line rows) are dropped.
/// The token line index is tesseract's `line_num` column.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RecognizedToken>> {
    let mut tokens = Vec::new();

    for (row, line) in tsv.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with("level") {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= TSV_CONF {
            return Err(OcrError::Output(format!(
                "row {} has {} columns",
                row + 1,
                fields.len()
            )));
        }

        let text = fields.get(TSV_TEXT).copied().unwrap_or("");
        if text.trim().is_empty() {
            continue;
        }

        let number = |idx: usize| -> Result<u32> {
            fields[idx].trim().parse::<u32>().map_err(|_| {
                OcrError::Output(format!("row {} column {}: {:?}", row + 1, idx, fields[idx]))
            })
        };
        let bbox = BoundingBox::new(
            number(TSV_LEFT)?,
            number(TSV_LEFT + 1)?,
            number(TSV_LEFT + 2)?,
            number(TSV_LEFT + 3)?,
        );
        let confidence: f32 = fields[TSV_CONF].trim().parse().map_err(|_| {
            OcrError::Output(format!("row {} confidence: {:?}", row + 1, fields[TSV_CONF]))
        })?;

        tokens.push(RecognizedToken::new(text, bbox, confidence, number(TSV_LINE_NUM)?));
    }

    trace!("Parsed {} tokens from TSV", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t1700\t2200\t-1\t
4\t1\t1\t1\t1\t0\t120\t80\t400\t42\t-1\t
5\t1\t1\t1\t1\t1\t120\t80\t400\t42\t91.42\tF609890101
5\t1\t1\t1\t2\t1\t118\t160\t150\t30\t88\tJOHN
5\t1\t1\t1\t2\t2\t280\t158\t170\t33\t87.5\tSMITH
";

    #[test]
    fn test_parse_tsv_words() {
        let tokens = parse_tsv(SAMPLE).unwrap();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "F609890101");
        assert_eq!(tokens[0].bbox, BoundingBox::new(120, 80, 400, 42));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[2].line, 2);
        assert_eq!(tokens[2].confidence, 87.5);
    }

    #[test]
    fn test_parse_tsv_rejects_truncated_rows() {
        assert!(parse_tsv("5\t1\t1\t1\t2").is_err());
    }

    #[test]
    fn test_missing_binary_is_engine_unavailable() {
        let engine = TesseractCli::new("/nonexistent/tesseract-binary");
        let image = DynamicImage::new_luma8(8, 8);
        let err = engine
            .recognize_text(&image, PageSegMode::SINGLE_BLOCK, None)
            .unwrap_err();
        assert!(matches!(err, OcrError::EngineUnavailable(_)));
    }
}
