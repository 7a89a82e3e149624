//! Batch orchestration: locate, extract, concatenate, export, log.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::classify::PageClassifier;
use crate::config::{Config, LocatorMode};
use crate::error::{Error, Result};
use crate::export::{CsvTableWriter, TableWriter};
use crate::extract::TableExtractor;
use crate::locate::{AutoLocator, NativeTextLocator, OcrLocator, PageLocator};
use crate::model::{Document, ExtractionResult, PageLog, RunReport, Table};
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::raster::{PdftoppmRasterizer, Rasterizer};

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once [`CancellationToken::cancel`] was called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// PDF files directly inside `dir`, sorted by file name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Runs the whole extraction for one document or a directory of them.
pub struct Pipeline {
    config: Config,
    rasterizer: Box<dyn Rasterizer>,
    engine: Box<dyn OcrEngine>,
    writer: Box<dyn TableWriter>,
}

impl Pipeline {
    /// Pipeline with pdftoppm, tesseract and CSV output.
    pub fn new(config: Config) -> Self {
        let rasterizer = Box::new(PdftoppmRasterizer::new(&config.raster));
        let engine = Box::new(TesseractEngine::new(&config.ocr));
        Self::with_collaborators(config, rasterizer, engine, Box::new(CsvTableWriter::new()))
    }

    /// Pipeline with caller-provided collaborators.
    pub fn with_collaborators(
        config: Config,
        rasterizer: Box<dyn Rasterizer>,
        engine: Box<dyn OcrEngine>,
        writer: Box<dyn TableWriter>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            engine,
            writer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Locator for the configured mode.
    pub fn locator(&self) -> Box<dyn PageLocator + '_> {
        let locator = &self.config.locator;
        match locator.mode {
            LocatorMode::Native => Box::new(NativeTextLocator::from_config(locator)),
            LocatorMode::Ocr => Box::new(OcrLocator::from_config(
                self.rasterizer.as_ref(),
                self.engine.as_ref(),
                locator,
            )),
            LocatorMode::Auto => Box::new(AutoLocator::new(
                NativeTextLocator::from_config(locator),
                OcrLocator::from_config(self.rasterizer.as_ref(), self.engine.as_ref(), locator),
                self.classifier(),
            )),
        }
    }

    pub fn classifier(&self) -> PageClassifier {
        PageClassifier::new(self.config.classifier.clone())
    }

    /// Strategy chain for the configured extractor settings.
    pub fn extractor(&self) -> TableExtractor<'_> {
        TableExtractor::from_config(
            &self.config.extractor,
            self.rasterizer.as_ref(),
            self.engine.as_ref(),
            self.config.output.debug_dir.clone(),
        )
    }

    /// Matching page indices of an open document.
    pub fn locate(&self, document: &Document, cancel: &CancellationToken) -> Result<Vec<usize>> {
        self.locator().locate(document, cancel)
    }

    /// Run the strategy chain on one page.
    pub fn extract_page(
        &self,
        document: &Document,
        page_index: usize,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult> {
        self.extractor().extract(document, page_index, cancel)
    }

    /// Extract every page and stack the results; `None` if no rows survive.
    pub fn extract_pages(
        &self,
        document: &Document,
        pages: &[usize],
        cancel: &CancellationToken,
    ) -> Result<Option<Table>> {
        let extractor = self.extractor();
        let classifier = self.classifier();
        let mut tables = Vec::new();

        for &page in pages {
            cancel.check()?;
            if let Ok(c) = classifier.classify_page(document, page) {
                log::info!("Page {} looks like a {} page", page + 1, c.kind);
            }
            let result = extractor.extract(document, page, cancel)?;
            if let Some(table) = result.table.filter(|t| !t.is_empty()) {
                tables.push(table);
            }
        }

        if tables.is_empty() {
            return Ok(None);
        }
        let mut merged = Table::concat(&tables);
        merged.drop_blank_rows();
        Ok((!merged.is_empty()).then_some(merged))
    }

    /// Output path for a document.
    pub fn output_path(&self, document: &Document) -> PathBuf {
        self.config
            .output
            .output_dir
            .join(format!("{}.{}", document.stem(), self.writer.extension()))
    }

    /// Process one PDF.
    ///
    /// Failures become an `ERROR` entry; only cancellation is returned as
    /// an error.
    pub fn process_document(&self, path: &Path, cancel: &CancellationToken) -> Result<PageLog> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Processing: {}", filename);

        match self.try_process(path, &filename, cancel) {
            Ok(entry) => Ok(entry),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                log::error!("Error on {}: {}", filename, e);
                Ok(PageLog::error(filename, e.to_string()))
            }
        }
    }

    fn try_process(
        &self,
        path: &Path,
        filename: &str,
        cancel: &CancellationToken,
    ) -> Result<PageLog> {
        let document = Document::open(path)?;

        let pages = self.locate(&document, cancel)?;
        if pages.is_empty() {
            return Ok(PageLog::skipped(filename));
        }
        log::info!("Form 1 pages in {}: {:?}", filename, pages);

        let Some(table) = self.extract_pages(&document, &pages, cancel)? else {
            log::warn!("Pages found, but no table data extracted for {}", filename);
            return Ok(PageLog::failed(filename));
        };

        let output = self.output_path(&document);
        self.writer.write(&table, &output)?;
        log::info!("Saved {} rows to: {}", table.row_count(), output.display());

        Ok(PageLog::success(filename, pages, table.row_count(), output))
    }

    /// Process every PDF in `dir`, in file name order.
    ///
    /// Cancellation stops the loop; the report holds the documents finished
    /// before it.
    pub fn process_directory(&self, dir: &Path, cancel: &CancellationToken) -> Result<RunReport> {
        let files = discover_pdfs(dir)?;
        log::info!("Found {} PDF files in {}", files.len(), dir.display());
        self.process_files(&files, cancel, |_| {})
    }

    /// Process the given files, calling `on_done` after each one.
    pub fn process_files<F>(
        &self,
        files: &[PathBuf],
        cancel: &CancellationToken,
        mut on_done: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&PageLog),
    {
        let mut report = RunReport::new();
        for path in files {
            if cancel.is_cancelled() {
                log::warn!("Run cancelled, {} documents processed", report.len());
                break;
            }
            match self.process_document(path, cancel) {
                Ok(entry) => {
                    on_done(&entry);
                    report.push(entry);
                }
                Err(Error::Cancelled) => {
                    log::warn!("Run cancelled, {} documents processed", report.len());
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Process a directory and write the run log to the configured path.
    pub fn run(&self, dir: &Path, cancel: &CancellationToken) -> Result<RunReport> {
        let report = self.process_directory(dir, cancel)?;
        report.write_csv(&self.config.output.log_path)?;
        log::info!("Process completed, log written to {}", self.config.output.log_path.display());
        Ok(report)
    }
}
