//! Per-document outcomes and the run log.

use std::fmt;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;

use crate::error::Result;

/// Final status of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Table rows were exported.
    Success,
    /// No page carried enough markers.
    Skipped,
    /// Pages matched but no strategy produced rows.
    Failed,
    /// The document could not be processed.
    Error(String),
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Success => "SUCCESS",
            PageStatus::Skipped => "SKIPPED (No Keywords)",
            PageStatus::Failed => "FAILED (Extraction)",
            PageStatus::Error(_) => "ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageStatus::Success)
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log record for one processed document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLog {
    pub filename: String,
    pub status: PageStatus,
    /// Matched page indices (0-indexed)
    pub pages: Vec<usize>,
    pub rows: usize,
    pub output: Option<PathBuf>,
}

impl PageLog {
    pub fn success(filename: impl Into<String>, pages: Vec<usize>, rows: usize, output: PathBuf) -> Self {
        Self {
            filename: filename.into(),
            status: PageStatus::Success,
            pages,
            rows,
            output: Some(output),
        }
    }

    pub fn skipped(filename: impl Into<String>) -> Self {
        Self::bare(filename, PageStatus::Skipped)
    }

    pub fn failed(filename: impl Into<String>) -> Self {
        Self::bare(filename, PageStatus::Failed)
    }

    pub fn error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::bare(filename, PageStatus::Error(message.into()))
    }

    fn bare(filename: impl Into<String>, status: PageStatus) -> Self {
        Self {
            filename: filename.into(),
            status,
            pages: Vec::new(),
            rows: 0,
            output: None,
        }
    }

    /// Error detail, if any.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            PageStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    fn record(&self) -> LogRecord<'_> {
        let success = self.status.is_success();
        LogRecord {
            filename: &self.filename,
            status: self.status.as_str(),
            pages: if success { format!("{:?}", self.pages) } else { String::new() },
            rows: if success { self.rows.to_string() } else { String::new() },
            output: self
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            error: self.error_message().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    filename: &'a str,
    status: &'static str,
    pages: String,
    rows: String,
    output: String,
    error: &'a str,
}

/// Outcomes of a batch run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub entries: Vec<PageLog>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PageLog) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose status has the same kind as `status`.
    pub fn count(&self, status: &PageStatus) -> usize {
        self.entries
            .iter()
            .filter(|e| std::mem::discriminant(&e.status) == std::mem::discriminant(status))
            .count()
    }

    /// Write the run log with columns `filename,status,pages,rows,output,error`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = WriterBuilder::new().from_path(path)?;
        self.write_records(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Render the run log as CSV text.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
        self.write_records(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::Error::Csv(e.into_error().to_string()))?;
        String::from_utf8(bytes).map_err(|e| crate::error::Error::Csv(e.to_string()))
    }

    fn write_records<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        if self.entries.is_empty() {
            writer.write_record(["filename", "status", "pages", "rows", "output", "error"])?;
        }
        for entry in &self.entries {
            writer.serialize(entry.record())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(PageStatus::Success.to_string(), "SUCCESS");
        assert_eq!(PageStatus::Skipped.to_string(), "SKIPPED (No Keywords)");
        assert_eq!(PageStatus::Failed.to_string(), "FAILED (Extraction)");
        assert_eq!(PageStatus::Error("boom".into()).to_string(), "ERROR");
    }

    #[test]
    fn test_run_log_csv() {
        let mut report = RunReport::new();
        report.push(PageLog::success("a.pdf", vec![0, 2], 5, PathBuf::from("out/a.csv")));
        report.push(PageLog::skipped("b.pdf"));
        report.push(PageLog::error("c.pdf", "bad xref"));

        let text = report.to_csv_string().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "filename,status,pages,rows,output,error");
        assert_eq!(lines[1], "a.pdf,SUCCESS,\"[0, 2]\",5,out/a.csv,");
        assert_eq!(lines[2], "b.pdf,SKIPPED (No Keywords),,,,");
        assert_eq!(lines[3], "c.pdf,ERROR,,,,bad xref");

        assert_eq!(report.count(&PageStatus::Error(String::new())), 1);
        assert_eq!(report.count(&PageStatus::Success), 1);
    }

    #[test]
    fn test_empty_report_has_header() {
        let text = RunReport::new().to_csv_string().unwrap();
        assert_eq!(text.trim(), "filename,status,pages,rows,output,error");
    }

    #[test]
    fn test_write_csv_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.csv");
        let mut report = RunReport::new();
        report.push(PageLog::failed("d.pdf"));
        report.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("d.pdf,FAILED (Extraction)"));
    }
}
