//! Table export.

use std::path::Path;

use csv::WriterBuilder;

use crate::error::{Error, Result};
use crate::model::Table;

/// Persists one document's table.
pub trait TableWriter {
    /// File extension of produced files, without the dot.
    fn extension(&self) -> &str;

    fn write(&self, table: &Table, path: &Path) -> Result<()>;
}

/// Writes a header row followed by every table row.
#[derive(Debug, Clone)]
pub struct CsvTableWriter {
    delimiter: u8,
}

impl CsvTableWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Render a table as CSV text.
    pub fn to_csv_string(&self, table: &Table) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(Vec::<u8>::new());
        write_rows(&mut writer, table)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Csv(e.into_error().to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Csv(format!("invalid utf-8 csv output: {e}")))
    }
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableWriter for CsvTableWriter {
    fn extension(&self) -> &str {
        "csv"
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(path)?;
        write_rows(&mut writer, table)?;
        writer.flush()?;
        Ok(())
    }
}

fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &Table) -> Result<()> {
    if let Some(headers) = &table.headers {
        writer.write_record(headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::with_headers(["Ref #", "Asset Description"]);
        table.add_row(vec!["1".into(), "House, 12 Main St".into()]);
        table.add_row(vec!["2".into(), "Car".into()]);
        table
    }

    #[test]
    fn test_csv_text_quotes_commas() {
        let text = CsvTableWriter::new().to_csv_string(&sample()).unwrap();
        assert_eq!(
            text,
            "Ref #,Asset Description\n1,\"House, 12 Main St\"\n2,Car\n"
        );
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("doc.csv");
        let writer = CsvTableWriter::new();
        writer.write(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(writer.extension(), "csv");
    }

    #[test]
    fn test_semicolon_delimiter() {
        let text = CsvTableWriter::new()
            .with_delimiter(b';')
            .to_csv_string(&sample())
            .unwrap();
        assert!(text.starts_with("Ref #;Asset Description\n"));
    }
}
