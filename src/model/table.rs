//! Table types.

use serde::{Deserialize, Serialize};

/// Column headers of the Form 1 asset schedule.
pub const FORM1_HEADERS: [&str; 7] = [
    "Ref #",
    "Asset Description",
    "Petition/Unscheduled Values",
    "Estimated Net Value",
    "Property Abandoned",
    "Sale/Funds",
    "Asset Fully Administered",
];

/// A table of string cells with optional header names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, when the producer knows them
    pub headers: Option<Vec<String>>,

    /// Rows of cells, top to bottom
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with named columns.
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: Some(headers.into_iter().map(Into::into).collect()),
            rows: Vec::new(),
        }
    }

    /// Empty table carrying the fixed Form 1 headers.
    pub fn form1() -> Self {
        Self::with_headers(FORM1_HEADERS)
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest of the header and every row.
    pub fn column_count(&self) -> usize {
        let header_width = self.headers.as_ref().map(Vec::len).unwrap_or(0);
        self.rows
            .iter()
            .map(Vec::len)
            .fold(header_width, usize::max)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove rows in which every cell is empty or whitespace.
    pub fn drop_blank_rows(&mut self) {
        self.rows.retain(|row| !is_blank_row(row));
    }

    /// Stack tables vertically.
    ///
    /// Headers are kept when every table carries the same ones; otherwise
    /// columns are named by position (`"0"`, `"1"`, ...). Every row is padded
    /// to the widest table.
    pub fn concat(tables: &[Table]) -> Table {
        let width = tables.iter().map(Table::column_count).max().unwrap_or(0);

        let shared = tables.first().and_then(|t| t.headers.clone()).filter(|first| {
            tables
                .iter()
                .all(|t| t.headers.as_ref() == Some(first))
                && first.len() == width
        });
        let headers = shared.unwrap_or_else(|| (0..width).map(|i| i.to_string()).collect());

        let rows = tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, String::new());
                row
            })
            .collect();

        Table {
            headers: Some(headers),
            rows,
        }
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// The strategy that produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Stream,
    Lattice,
    TextLayout,
    SpatialOcr,
}

impl ExtractionMethod {
    /// Tag used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Stream => "stream",
            ExtractionMethod::Lattice => "lattice",
            ExtractionMethod::TextLayout => "text_layout",
            ExtractionMethod::SpatialOcr => "spatial_ocr",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of extracting one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub table: Option<Table>,
    pub method: Option<ExtractionMethod>,
}

impl ExtractionResult {
    /// No strategy produced rows.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn found(table: Table, method: ExtractionMethod) -> Self {
        Self {
            table: Some(table),
            method: Some(method),
        }
    }

    pub fn is_found(&self) -> bool {
        self.table.is_some()
    }
}

/// Fixed horizontal column boundaries over a normalized page width.
///
/// `bounds[i]` is the lower edge of column `i + 1`, so a layout with `n`
/// bounds has `n + 1` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    bounds: Vec<f32>,
}

impl ColumnLayout {
    /// Build a layout from ascending lower edges.
    pub fn new(bounds: Vec<f32>) -> Self {
        Self { bounds }
    }

    /// The seven-column Form 1 layout.
    pub fn form1() -> Self {
        Self::new(vec![0.045, 0.390, 0.510, 0.630, 0.710, 0.870])
    }

    pub fn column_count(&self) -> usize {
        self.bounds.len() + 1
    }

    /// Column index of a horizontal position normalized to `[0, 1]`.
    /// Positions outside that range clamp to the edge columns.
    pub fn assign(&self, x: f32) -> usize {
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        self.bounds.iter().take_while(|&&b| x >= b).count()
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::form1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_form1_column_assignment() {
        let layout = ColumnLayout::form1();
        assert_eq!(layout.column_count(), 7);
        assert_eq!(layout.assign(0.0), 0);
        assert_eq!(layout.assign(0.044), 0);
        assert_eq!(layout.assign(0.045), 1);
        assert_eq!(layout.assign(0.389), 1);
        assert_eq!(layout.assign(0.39), 2);
        assert_eq!(layout.assign(0.6), 3);
        assert_eq!(layout.assign(0.7), 4);
        assert_eq!(layout.assign(0.8), 5);
        assert_eq!(layout.assign(0.87), 6);
        assert_eq!(layout.assign(1.0), 6);
    }

    #[test]
    fn test_column_assignment_clamps() {
        let layout = ColumnLayout::form1();
        assert_eq!(layout.assign(-0.5), 0);
        assert_eq!(layout.assign(1.7), 6);
        assert_eq!(layout.assign(f32::NAN), 0);
    }

    #[test]
    fn test_drop_blank_rows() {
        let mut table = Table::form1();
        table.add_row(row(&["1", "House"]));
        table.add_row(row(&["", "  "]));
        table.add_row(row(&[]));
        table.drop_blank_rows();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_concat_shared_headers() {
        let mut a = Table::with_headers(["A", "B"]);
        a.add_row(row(&["1", "2"]));
        let mut b = Table::with_headers(["A", "B"]);
        b.add_row(row(&["3"]));

        let merged = Table::concat(&[a, b]);
        assert_eq!(merged.headers, Some(row(&["A", "B"])));
        assert_eq!(merged.rows, vec![row(&["1", "2"]), row(&["3", ""])]);
    }

    #[test]
    fn test_concat_mismatched_headers_are_positional() {
        let mut a = Table::with_headers(["A", "B"]);
        a.add_row(row(&["1", "2"]));
        let mut b = Table::new();
        b.add_row(row(&["x", "y", "z"]));

        let merged = Table::concat(&[a, b]);
        assert_eq!(merged.headers, Some(row(&["0", "1", "2"])));
        assert_eq!(merged.rows[0], row(&["1", "2", ""]));
        assert_eq!(merged.column_count(), 3);
    }

    #[test]
    fn test_method_tags() {
        assert_eq!(ExtractionMethod::SpatialOcr.to_string(), "spatial_ocr");
        assert_eq!(ExtractionMethod::TextLayout.as_str(), "text_layout");
        assert!(!ExtractionResult::absent().is_found());
    }
}
