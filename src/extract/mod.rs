//! Table extraction.
//!
//! A [`TableExtractor`] holds an ordered chain of [`TableStrategy`] values and
//! returns the first table any of them produces. The native strategies read
//! the embedded text layer; the spatial strategy renders the page and bins OCR
//! tokens into the fixed Form 1 columns.

mod lattice;
mod spatial;
mod stream;
mod text_layout;

pub use lattice::LatticeStrategy;
pub use spatial::{bin_tokens, is_noise_row, SpatialOcrStrategy};
pub use stream::{StreamDetector, StreamStrategy};
pub use text_layout::TextLayoutStrategy;

use std::path::PathBuf;

use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::model::{Document, ExtractionMethod, ExtractionResult, Table};
use crate::ocr::OcrEngine;
use crate::pipeline::CancellationToken;
use crate::raster::Rasterizer;

/// One way of recovering a table from a page.
pub trait TableStrategy {
    /// Tag recorded on tables this strategy produces.
    fn method(&self) -> ExtractionMethod;

    /// Disabled strategies stay in the chain and are skipped.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Extract a table from page `page_index` (0-indexed).
    ///
    /// `Ok(None)` means the strategy ran and found nothing.
    fn extract(&self, document: &Document, page_index: usize) -> Result<Option<Table>>;
}

/// Ordered strategy chain; first success wins.
pub struct TableExtractor<'a> {
    strategies: Vec<Box<dyn TableStrategy + 'a>>,
}

impl<'a> TableExtractor<'a> {
    /// Build a chain from explicit strategies.
    pub fn new(strategies: Vec<Box<dyn TableStrategy + 'a>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: stream, lattice, text layout, spatial OCR.
    pub fn from_config(
        config: &ExtractorConfig,
        rasterizer: &'a dyn Rasterizer,
        engine: &'a dyn OcrEngine,
        debug_dir: Option<PathBuf>,
    ) -> Self {
        Self::new(vec![
            Box::new(StreamStrategy::new(config.stream.clone())),
            Box::new(LatticeStrategy::new(config.lattice.clone())),
            Box::new(TextLayoutStrategy::new(config.text_layout.clone())),
            Box::new(SpatialOcrStrategy::new(
                rasterizer,
                engine,
                config.spatial.clone(),
                debug_dir,
            )),
        ])
    }

    /// Strategy tags in chain order, with their enabled flag.
    pub fn chain(&self) -> Vec<(ExtractionMethod, bool)> {
        self.strategies
            .iter()
            .map(|s| (s.method(), s.is_enabled()))
            .collect()
    }

    /// Run the chain on one page.
    ///
    /// Strategy errors and empty tables advance the chain. The only error
    /// returned is [`crate::Error::Cancelled`].
    pub fn extract(
        &self,
        document: &Document,
        page_index: usize,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult> {
        for strategy in &self.strategies {
            cancel.check()?;
            let method = strategy.method();
            if !strategy.is_enabled() {
                log::debug!("Strategy {} disabled, skipping", method);
                continue;
            }

            log::debug!("Trying {} on page {}", method, page_index + 1);
            match strategy.extract(document, page_index) {
                Ok(Some(table)) if !table.is_empty() => {
                    log::info!(
                        "Extracted {} rows from page {} using {}",
                        table.row_count(),
                        page_index + 1,
                        method
                    );
                    return Ok(ExtractionResult::found(table, method));
                }
                Ok(_) => log::debug!("{} found no rows on page {}", method, page_index + 1),
                Err(e) => log::log!(
                    failure_level(method),
                    "{} failed on page {}: {}",
                    method,
                    page_index + 1,
                    e
                ),
            }
        }

        log::error!("All extraction methods failed for page {}", page_index + 1);
        Ok(ExtractionResult::absent())
    }
}

/// OCR is the last resort, so its failure is reported loudly.
fn failure_level(method: ExtractionMethod) -> log::Level {
    match method {
        ExtractionMethod::SpatialOcr => log::Level::Error,
        _ => log::Level::Debug,
    }
}
