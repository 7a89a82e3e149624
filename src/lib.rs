//! # form1x
//!
//! Locates "Form 1" bankruptcy asset schedules in PDF documents and extracts
//! their 7-column asset table into rows.
//!
//! Machine-readable pages are read from the embedded text layer; scanned pages
//! are rendered with `pdftoppm`, straightened, cleaned up and read with
//! `tesseract`, and the recognized words are binned into the fixed Form 1
//! column grid.
//!
//! ## Quick Start
//!
//! ```no_run
//! use form1x::{CancellationToken, Config, Pipeline};
//!
//! fn main() -> form1x::Result<()> {
//!     let pipeline = Pipeline::new(Config::default().with_output_dir("./output"));
//!     let report = pipeline.run("./input_pdfs".as_ref(), &CancellationToken::new())?;
//!     println!("{} documents processed", report.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Keyword page location**: native text or OCR, with separate thresholds
//! - **Strategy chain**: stream, lattice and text-layout detection on the text
//!   layer, spatial OCR binning as the last resort
//! - **Orientation correction**: quarter turns detected by tesseract OSD
//! - **CSV export**: one file per document plus a run log

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod locate;
pub mod model;
pub mod normalize;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod raster;

// Re-export commonly used types
pub use classify::{Classification, PageClassifier, PageKind};
pub use config::{Config, LocatorMode};
pub use error::{Error, Result};
pub use export::{CsvTableWriter, TableWriter};
pub use extract::{TableExtractor, TableStrategy};
pub use locate::{KeywordSet, MatchThreshold, PageLocator};
pub use model::{
    ColumnLayout, Document, ExtractionMethod, ExtractionResult, PageLog, PageStatus, RunReport,
    Table,
};
pub use normalize::{normalize, normalize_opt};
pub use ocr::{OcrEngine, TesseractEngine};
pub use pipeline::{CancellationToken, Pipeline};
pub use raster::{DpiTier, PdftoppmRasterizer, Rasterizer};

use std::path::Path;

/// Find the Form 1 pages of a PDF from its embedded text.
///
/// # Example
///
/// ```no_run
/// let pages = form1x::locate_pages("filing.pdf").unwrap();
/// println!("Form 1 on pages {:?}", pages);
/// ```
pub fn locate_pages<P: AsRef<Path>>(path: P) -> Result<Vec<usize>> {
    let document = Document::open(path)?;
    locate::NativeTextLocator::default().locate(&document, &CancellationToken::new())
}

/// Extract the table of one page with the default strategy chain.
///
/// # Example
///
/// ```no_run
/// let result = form1x::extract_page("filing.pdf", 0).unwrap();
/// if let Some(table) = result.table {
///     println!("{} rows via {:?}", table.row_count(), result.method);
/// }
/// ```
pub fn extract_page<P: AsRef<Path>>(path: P, page_index: usize) -> Result<ExtractionResult> {
    let document = Document::open(path)?;
    Pipeline::new(Config::default().without_debug_dir()).extract_page(
        &document,
        page_index,
        &CancellationToken::new(),
    )
}

/// Process every PDF in a directory with the given configuration and write
/// the run log.
pub fn process_directory<P: AsRef<Path>>(dir: P, config: Config) -> Result<RunReport> {
    Pipeline::new(config).run(dir.as_ref(), &CancellationToken::new())
}
