//! Orientation correction for scanned pages.

use std::sync::OnceLock;

use image::DynamicImage;
use regex::Regex;

use super::OcrEngine;

fn rotate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Rotate:\s*(\d+)").expect("valid regex"))
}

/// Extract the `Rotate:` angle from an orientation report.
pub fn parse_rotation(report: &str) -> Option<u32> {
    rotate_pattern()
        .captures(report)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Rotates page images upright using the OCR engine's orientation detection.
pub struct OrientationCorrector<'a, E: OcrEngine + ?Sized> {
    engine: &'a E,
}

impl<'a, E: OcrEngine + ?Sized> OrientationCorrector<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Detected rotation in degrees; 0 when detection fails.
    pub fn detect(&self, image: &DynamicImage) -> u32 {
        match self.engine.detect_orientation(image) {
            Ok(report) => parse_rotation(&report).unwrap_or(0),
            Err(e) => {
                log::debug!("Orientation detection failed: {}", e);
                0
            }
        }
    }

    /// Return `image` turned upright.
    ///
    /// The reported angle is undone by rotating clockwise by it; quarter
    /// turns swap width and height so nothing is cropped.
    pub fn correct(&self, image: DynamicImage) -> DynamicImage {
        let angle = self.detect(&image);
        rotate_clockwise(image, angle)
    }
}

/// Rotate clockwise by a multiple of 90 degrees.
pub fn rotate_clockwise(image: DynamicImage, angle: u32) -> DynamicImage {
    match angle % 360 {
        0 => image,
        90 => {
            log::info!("Correcting orientation: rotating 90 degrees");
            image.rotate90()
        }
        180 => {
            log::info!("Correcting orientation: rotating 180 degrees");
            image.rotate180()
        }
        270 => {
            log::info!("Correcting orientation: rotating 270 degrees");
            image.rotate270()
        }
        other => {
            log::warn!("Unsupported rotation of {} degrees, leaving page as is", other);
            image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::TextBlock;
    use image::{GenericImageView, Luma};

    struct FixedOsd(Option<&'static str>);

    impl OcrEngine for FixedOsd {
        fn recognize_text(&self, _image: &DynamicImage) -> Result<String> {
            Ok(String::new())
        }
        fn recognize_tokens(&self, _image: &DynamicImage, _page: usize) -> Result<Vec<TextBlock>> {
            Ok(Vec::new())
        }
        fn detect_orientation(&self, _image: &DynamicImage) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::Ocr("too few characters".to_string()))
        }
    }

    /// 3x2 image with one marked pixel at the top-left corner.
    fn marked() -> DynamicImage {
        let mut img = image::GrayImage::from_pixel(3, 2, Luma([255]));
        img.put_pixel(0, 0, Luma([0]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_parse_rotation() {
        let report = "Page number: 0\nOrientation in degrees: 270\nRotate: 90\nOrientation confidence: 6.1\n";
        assert_eq!(parse_rotation(report), Some(90));
        assert_eq!(parse_rotation("Rotate:180"), Some(180));
        assert_eq!(parse_rotation("nothing here"), None);
    }

    #[test]
    fn test_rotates_with_canvas_expansion() {
        let engine = FixedOsd(Some("Rotate: 90"));
        let fixed = OrientationCorrector::new(&engine).correct(marked());
        assert_eq!(fixed.dimensions(), (2, 3));
        // clockwise: top-left lands at top-right
        assert_eq!(fixed.to_luma8().get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_zero_or_failure_is_unchanged() {
        let zero = FixedOsd(Some("Rotate: 0"));
        let same = OrientationCorrector::new(&zero).correct(marked());
        assert_eq!(same.dimensions(), (3, 2));

        let broken = FixedOsd(None);
        let same = OrientationCorrector::new(&broken).correct(marked());
        assert_eq!(same.dimensions(), (3, 2));
        assert_eq!(same.to_luma8().get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_odd_angle_left_alone() {
        let rotated = rotate_clockwise(marked(), 45);
        assert_eq!(rotated.dimensions(), (3, 2));
    }
}
