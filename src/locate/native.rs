//! Keyword scan over the embedded text layer.

use crate::config::LocatorConfig;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::pipeline::CancellationToken;

use super::{KeywordSet, MatchThreshold, PageLocator};

/// Locates pages from embedded text without rendering anything.
#[derive(Debug, Clone)]
pub struct NativeTextLocator {
    keywords: KeywordSet,
    threshold: MatchThreshold,
}

impl NativeTextLocator {
    pub fn new(keywords: KeywordSet, threshold: MatchThreshold) -> Self {
        Self {
            keywords,
            threshold,
        }
    }

    pub fn from_config(config: &LocatorConfig) -> Self {
        Self::new(
            KeywordSet::new(config.keywords.iter()),
            config.native_threshold,
        )
    }

    /// Distinct markers in the page's embedded text.
    ///
    /// A page whose content stream cannot be read counts as zero matches.
    pub fn count_markers(&self, document: &Document, index: usize) -> Result<usize> {
        match document.page_text(index) {
            Ok(text) => Ok(self.keywords.count_raw(&text)),
            Err(e @ Error::PageOutOfRange(..)) => Err(e),
            Err(e) => {
                log::warn!("Could not read text of page {}: {}", index + 1, e);
                Ok(0)
            }
        }
    }

    pub fn page_matches(&self, document: &Document, index: usize) -> Result<bool> {
        let count = self.count_markers(document, index)?;
        let matched = self.threshold.is_satisfied(count);
        if matched {
            log::info!(
                "Page {} matches with {} markers (native text)",
                index + 1,
                count
            );
        } else if count > 0 {
            log::debug!(
                "Page {}: {} markers, needs {}",
                index + 1,
                count,
                self.threshold
            );
        }
        Ok(matched)
    }
}

impl Default for NativeTextLocator {
    fn default() -> Self {
        Self::from_config(&LocatorConfig::default())
    }
}

impl PageLocator for NativeTextLocator {
    fn locate(&self, document: &Document, cancel: &CancellationToken) -> Result<Vec<usize>> {
        log::info!("Scanning {} pages for markers", document.page_count());
        let mut pages = Vec::new();
        for index in 0..document.page_count() {
            cancel.check()?;
            if self.page_matches(document, index)? {
                pages.push(index);
            }
        }
        if pages.is_empty() {
            log::warn!("No Form 1 markers found in {}", document.file_name());
        }
        Ok(pages)
    }
}
