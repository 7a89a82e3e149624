//! Text-versus-image page classification.

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::model::{Document, TextBlock};

/// Dominant content of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Text,
    Image,
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PageKind::Text => "text",
            PageKind::Image => "image",
        })
    }
}

/// Classification with the figures that led to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: PageKind,
    pub text_area: f32,
    pub image_area: f32,
    pub ratio: f32,
}

/// Area-ratio heuristic over text blocks and embedded images.
#[derive(Debug, Clone, Default)]
pub struct PageClassifier {
    config: ClassifierConfig,
}

impl PageClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// `ratio = text / (text + images * proxy + 1)`; above the threshold is text.
    pub fn classify(&self, blocks: &[TextBlock], image_count: usize) -> Classification {
        let text_area: f32 = blocks.iter().map(|b| b.bbox.area()).sum();
        let image_area = image_count as f32 * self.config.image_area_proxy;
        let ratio = text_area / (text_area + image_area + 1.0);
        let kind = if ratio > self.config.text_ratio_threshold {
            PageKind::Text
        } else {
            PageKind::Image
        };
        Classification {
            kind,
            text_area,
            image_area,
            ratio,
        }
    }

    /// Classify page `index` of an open document.
    pub fn classify_page(&self, document: &Document, index: usize) -> Result<Classification> {
        let info = document.page_info(index)?;
        let blocks = document.text_blocks(index)?;
        let result = self.classify(&blocks, info.image_count);
        log::debug!(
            "Page {} classified as {} (ratio {:.3})",
            index,
            result.kind,
            result.ratio
        );
        Ok(result)
    }
}
