//! Page-level types.

use serde::{Deserialize, Serialize};

/// Static attributes of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page index (0-indexed)
    pub index: usize,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,

    /// Number of embedded image XObjects
    pub image_count: usize,
}

impl PageInfo {
    /// Whether the page embeds any raster image.
    pub fn has_images(&self) -> bool {
        self.image_count > 0
    }

    /// 1-indexed page number.
    pub fn number(&self) -> u32 {
        self.index as u32 + 1
    }
}

/// Axis-aligned box in top-left origin coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// A text token or block located on a page.
///
/// OCR tokens carry a confidence in `0..=100`; blocks read from the embedded
/// text layer carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// The text content
    pub text: String,

    /// Bounding box (pixels for OCR tokens, points for native blocks)
    pub bbox: BoundingBox,

    /// Recognition confidence, OCR only
    pub confidence: Option<f32>,

    /// Page index (0-indexed)
    pub page: usize,
}

impl TextBlock {
    /// Create a native text block.
    pub fn native(text: impl Into<String>, bbox: BoundingBox, page: usize) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: None,
            page,
        }
    }

    /// Create an OCR token with its confidence.
    pub fn ocr(text: impl Into<String>, bbox: BoundingBox, confidence: f32, page: usize) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: Some(confidence),
            page,
        }
    }
}
