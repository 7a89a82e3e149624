//! Keyword scan over OCR text of scanned pages.

use crate::config::LocatorConfig;
use crate::error::Result;
use crate::model::Document;
use crate::ocr::{OcrEngine, OrientationCorrector};
use crate::pipeline::CancellationToken;
use crate::raster::{DpiTier, Rasterizer};

use super::{KeywordSet, MatchThreshold, PageLocator};

/// Locates pages by rendering and recognizing the ones that embed images.
pub struct OcrLocator<'a> {
    rasterizer: &'a dyn Rasterizer,
    engine: &'a dyn OcrEngine,
    keywords: KeywordSet,
    threshold: MatchThreshold,
}

impl<'a> OcrLocator<'a> {
    pub fn new(
        rasterizer: &'a dyn Rasterizer,
        engine: &'a dyn OcrEngine,
        keywords: KeywordSet,
        threshold: MatchThreshold,
    ) -> Self {
        Self {
            rasterizer,
            engine,
            keywords,
            threshold,
        }
    }

    pub fn from_config(
        rasterizer: &'a dyn Rasterizer,
        engine: &'a dyn OcrEngine,
        config: &LocatorConfig,
    ) -> Self {
        Self::new(
            rasterizer,
            engine,
            KeywordSet::new(config.keywords.iter()),
            config.ocr_threshold,
        )
    }

    fn count_markers(&self, document: &Document, index: usize) -> Result<usize> {
        let image = self
            .rasterizer
            .rasterize(document.path(), index, DpiTier::Locator)?;
        let image = OrientationCorrector::new(self.engine).correct(image);
        let text = self.engine.recognize_text(&image)?;
        Ok(self.keywords.count_raw(&text))
    }

    /// OCR one page; failures are logged and count as no match.
    pub fn page_matches(&self, document: &Document, index: usize) -> bool {
        let count = match self.count_markers(document, index) {
            Ok(count) => count,
            Err(e) => {
                log::warn!("OCR failed on page {}: {}", index + 1, e);
                0
            }
        };
        let matched = self.threshold.is_satisfied(count);
        if matched {
            log::info!("Page {} matches with {} markers (OCR)", index + 1, count);
        }
        matched
    }
}

impl PageLocator for OcrLocator<'_> {
    fn locate(&self, document: &Document, cancel: &CancellationToken) -> Result<Vec<usize>> {
        let mut pages = Vec::new();
        for index in 0..document.page_count() {
            cancel.check()?;
            let info = document.page_info(index)?;
            if !info.has_images() {
                continue;
            }
            log::info!("Running OCR on page {}", index + 1);
            if self.page_matches(document, index) {
                pages.push(index);
            }
        }
        if pages.is_empty() {
            log::warn!("No Form 1 markers found by OCR in {}", document.file_name());
        }
        Ok(pages)
    }
}
