//! Bordered tables from ruling lines.

use crate::config::LatticeConfig;
use crate::error::Result;
use crate::model::{Document, ExtractionMethod, Table};
use crate::parser::{PageContent, Rule};

use super::TableStrategy;

/// Builds a cell grid from the page's horizontal and vertical rules and
/// drops each span into the cell containing its anchor point.
#[derive(Debug, Clone, Default)]
pub struct LatticeStrategy {
    config: LatticeConfig,
}

impl LatticeStrategy {
    pub fn new(config: LatticeConfig) -> Self {
        Self { config }
    }

    /// Grid lines as (ys descending, xs ascending).
    fn grid(&self, rules: &[Rule]) -> (Vec<f32>, Vec<f32>) {
        let thickness = self.config.max_rule_thickness;
        let mut ys: Vec<f32> = rules
            .iter()
            .filter(|r| r.is_horizontal(thickness))
            .map(|r| (r.y0 + r.y1) / 2.0)
            .collect();
        let mut xs: Vec<f32> = rules
            .iter()
            .filter(|r| r.is_vertical(thickness))
            .map(|r| (r.x0 + r.x1) / 2.0)
            .collect();

        ys.sort_by(|a, b| b.total_cmp(a));
        xs.sort_by(f32::total_cmp);
        (
            merge_close(ys, self.config.line_tol),
            merge_close(xs, self.config.line_tol),
        )
    }

    /// Table from already-extracted page content.
    pub fn detect(&self, content: &PageContent) -> Option<Table> {
        let (ys, xs) = self.grid(&content.rules);
        if ys.len() < 2 || xs.len() < 2 {
            log::debug!("lattice: {} horizontal, {} vertical rules", ys.len(), xs.len());
            return None;
        }

        let rows = ys.len() - 1;
        let cols = xs.len() - 1;
        let mut cells: Vec<Vec<Vec<&str>>> = vec![vec![Vec::new(); cols]; rows];

        let mut spans: Vec<_> = content.spans.iter().collect();
        spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
        for span in spans {
            let cx = span.center_x();
            let cy = span.y + span.font_size * 0.3;
            let row = ys.windows(2).position(|w| cy <= w[0] && cy > w[1]);
            let col = xs.windows(2).position(|w| cx >= w[0] && cx < w[1]);
            if let (Some(r), Some(c)) = (row, col) {
                cells[r][c].push(span.text.trim());
            }
        }

        let mut table = Table::new();
        for row in cells {
            table.add_row(row.into_iter().map(|c| c.join(" ")).collect());
        }
        table.drop_blank_rows();
        (!table.is_empty()).then_some(table)
    }
}

/// Collapse sorted positions closer than `tol` to the first of each run.
fn merge_close(sorted: Vec<f32>, tol: f32) -> Vec<f32> {
    let mut out: Vec<f32> = Vec::new();
    for v in sorted {
        match out.last() {
            Some(&last) if (v - last).abs() <= tol => {}
            _ => out.push(v),
        }
    }
    out
}

impl TableStrategy for LatticeStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Lattice
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn extract(&self, document: &Document, page_index: usize) -> Result<Option<Table>> {
        let content = document.page_content(page_index)?;
        Ok(self.detect(&content))
    }
}
