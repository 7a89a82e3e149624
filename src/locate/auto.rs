//! Native scan with OCR for image-heavy pages that did not match.

use crate::classify::{PageClassifier, PageKind};
use crate::error::Result;
use crate::model::Document;
use crate::pipeline::CancellationToken;

use super::{NativeTextLocator, OcrLocator, PageLocator};

/// Runs the native check on every page and the OCR check on pages that
/// failed it and classify as [`PageKind::Image`].
pub struct AutoLocator<'a> {
    native: NativeTextLocator,
    ocr: OcrLocator<'a>,
    classifier: PageClassifier,
}

impl<'a> AutoLocator<'a> {
    pub fn new(native: NativeTextLocator, ocr: OcrLocator<'a>, classifier: PageClassifier) -> Self {
        Self {
            native,
            ocr,
            classifier,
        }
    }
}

impl PageLocator for AutoLocator<'_> {
    fn locate(&self, document: &Document, cancel: &CancellationToken) -> Result<Vec<usize>> {
        let mut pages = Vec::new();
        for index in 0..document.page_count() {
            cancel.check()?;
            if self.native.page_matches(document, index)? {
                pages.push(index);
                continue;
            }
            let kind = match self.classifier.classify_page(document, index) {
                Ok(c) => c.kind,
                Err(e) => {
                    log::debug!("Classification of page {} failed: {}", index + 1, e);
                    PageKind::Image
                }
            };
            if kind == PageKind::Image && document.page_info(index)?.has_images() {
                log::info!("Page {} looks scanned, trying OCR", index + 1);
                if self.ocr.page_matches(document, index) {
                    pages.push(index);
                }
            }
        }
        if pages.is_empty() {
            log::warn!("No Form 1 markers found in {}", document.file_name());
        }
        Ok(pages)
    }
}
