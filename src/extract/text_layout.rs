//! Line-based fallback: every text line with enough gaps becomes a row.

use crate::config::TextLayoutConfig;
use crate::error::Result;
use crate::model::{Document, ExtractionMethod, Table};
use crate::parser::{group_spans_into_lines, TextLine, TextSpan};

use super::TableStrategy;

#[derive(Debug, Clone, Default)]
pub struct TextLayoutStrategy {
    config: TextLayoutConfig,
}

impl TextLayoutStrategy {
    pub fn new(config: TextLayoutConfig) -> Self {
        Self { config }
    }

    /// Split a line into cells at gaps wider than `min_gap`.
    fn split_cells(&self, line: &TextLine) -> Vec<String> {
        let mut cells: Vec<String> = Vec::new();
        let mut prev: Option<&TextSpan> = None;
        for span in &line.spans {
            let text = span.text.trim();
            match (prev, cells.last_mut()) {
                (Some(p), Some(cell)) if span.x - p.right() <= self.config.min_gap => {
                    if !cell.is_empty() && !text.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(text);
                }
                _ => cells.push(text.to_string()),
            }
            prev = Some(span);
        }
        cells
    }

    pub fn detect(&self, spans: &[TextSpan]) -> Option<Table> {
        let mut table = Table::new();
        for line in group_spans_into_lines(spans, self.config.row_tol) {
            let cells = self.split_cells(&line);
            if cells.len() >= self.config.min_cells {
                table.add_row(cells);
            }
        }

        let width = table.column_count();
        for row in &mut table.rows {
            row.resize(width, String::new());
        }
        table.drop_blank_rows();
        (!table.is_empty()).then_some(table)
    }
}

impl TableStrategy for TextLayoutStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::TextLayout
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn extract(&self, document: &Document, page_index: usize) -> Result<Option<Table>> {
        let content = document.page_content(page_index)?;
        Ok(self.detect(&content.spans))
    }
}
