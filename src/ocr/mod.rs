//! OCR collaborators.
//!
//! The [`OcrEngine`] trait is what the locators and the spatial extractor
//! depend on. [`TesseractEngine`] implements it by running the `tesseract`
//! command-line tool on a temporary PNG.

pub mod orientation;
pub mod preprocess;

use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use crate::config::OcrConfig;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, TextBlock};

pub use orientation::{parse_rotation, OrientationCorrector};
pub use preprocess::{median_denoise, otsu_threshold, preprocess};

/// Text recognition over a page image.
pub trait OcrEngine {
    /// Recognize the whole image as one uniform block of text.
    fn recognize_text(&self, image: &DynamicImage) -> Result<String>;

    /// Recognize words with pixel bounding boxes and confidences.
    fn recognize_tokens(&self, image: &DynamicImage, page: usize) -> Result<Vec<TextBlock>>;

    /// Orientation and script detection report.
    fn detect_orientation(&self, image: &DynamicImage) -> Result<String>;
}

/// [`OcrEngine`] backed by the tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.language.clone(),
            psm: config.page_segmentation_mode,
        }
    }

    /// Check if the executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command).arg("--version").output().is_ok()
    }

    /// Run tesseract on `image` and return its stdout.
    fn run(&self, image: &DynamicImage, psm: u8, extra: &[&str]) -> Result<String> {
        let input = tempfile::Builder::new()
            .prefix("form1x_ocr_")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let mut command = Command::new(&self.command);
        command.arg(input.path()).arg("stdout").arg("--psm").arg(psm.to_string());
        if psm != 0 {
            command.arg("-l").arg(&self.language);
        }
        let output = command.args(extra).output().map_err(|e| {
            Error::Ocr(format!("failed to run {}: {}", self.command.display(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("tesseract failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        self.run(image, self.psm, &[])
    }

    fn recognize_tokens(&self, image: &DynamicImage, page: usize) -> Result<Vec<TextBlock>> {
        let tsv = self.run(image, self.psm, &["tsv"])?;
        parse_tsv(&tsv, page)
    }

    fn detect_orientation(&self, image: &DynamicImage) -> Result<String> {
        // OSD writes its report to stderr on some builds
        let input = tempfile::Builder::new()
            .prefix("form1x_osd_")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .args(["--psm", "0"])
            .output()
            .map_err(|e| {
                Error::Ocr(format!("failed to run {}: {}", self.command.display(), e))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("orientation detection failed: {}", stderr.trim())));
        }

        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(report)
    }
}

/// Parse tesseract TSV output into word tokens.
///
/// Only word-level rows (level 5) with non-blank text are kept; rows with a
/// confidence of -1 are layout records, not words.
pub fn parse_tsv(tsv: &str, page: usize) -> Result<Vec<TextBlock>> {
    let mut tokens = Vec::new();
    for (line_no, line) in tsv.lines().enumerate() {
        if line_no == 0 && line.starts_with("level") {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.splitn(12, '\t').collect();
        if fields.len() < 11 {
            return Err(Error::Ocr(format!("malformed TSV row {}: {:?}", line_no + 1, line)));
        }
        if fields[0] != "5" {
            continue;
        }

        let text = fields.get(11).map(|t| t.trim()).unwrap_or_default();
        if text.is_empty() {
            continue;
        }

        let number = |i: usize| -> Result<f32> {
            fields[i].trim().parse::<f32>().map_err(|_| {
                Error::Ocr(format!("bad number {:?} in TSV row {}", fields[i], line_no + 1))
            })
        };
        let bbox = BoundingBox::new(number(6)?, number(7)?, number(8)?, number(9)?);
        tokens.push(TextBlock::ocr(text, bbox, number(10)?, page));
    }
    Ok(tokens)
}
