//! Borderless table detection from text alignment (stream mode).
//!
//! Rows are spans sharing a baseline; columns are left edges that line up
//! across rows. A table is the first run of consecutive multi-span rows that
//! align with those columns and sit no more than `edge_tol` apart.

use std::collections::{HashMap, HashSet};

use crate::config::StreamConfig;
use crate::error::Result;
use crate::model::{Document, ExtractionMethod, Table};
use crate::parser::TextSpan;

use super::TableStrategy;

/// Left edges within this many points share a bucket.
const EDGE_BUCKET: f32 = 5.0;

/// Span-to-column alignment tolerance in points.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A row of text spans.
#[derive(Debug, Clone)]
pub struct SpanRow {
    /// Baseline of the row (mean of its spans)
    pub y: f32,
    /// Spans sorted by X
    pub spans: Vec<TextSpan>,
}

/// Detects the topmost borderless table in a set of spans.
#[derive(Debug, Clone, Default)]
pub struct StreamDetector {
    config: StreamConfig,
}

impl StreamDetector {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Detect a table; `None` when no region qualifies.
    pub fn detect(&self, spans: &[TextSpan]) -> Option<Table> {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            log::debug!("stream: not enough spans ({})", spans.len());
            return None;
        }

        let rows = self.group_into_rows(spans);
        let columns = self.detect_columns(&rows);
        log::debug!(
            "stream: {} rows, {} candidate columns at {:?}",
            rows.len(),
            columns.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return None;
        }

        for (start, end) in self.find_table_regions(&rows, &columns) {
            let region = &rows[start..=end];
            let region_columns = self.detect_columns(region);
            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if region_columns.len() > self.config.max_columns {
                log::debug!(
                    "stream: skipping region with {} columns (max {})",
                    region_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if is_list_pattern(region, &region_columns) {
                log::debug!("stream: skipping list-like region");
                continue;
            }
            return Some(self.to_table(region, &region_columns));
        }
        None
    }

    /// Group spans into rows, top of the page first.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<SpanRow> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut rows: Vec<SpanRow> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            match current_y {
                Some(y) if (span.y - y).abs() <= self.config.row_tol => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(span);
                }
            }
        }
        if !current.is_empty() {
            rows.push(make_row(current));
        }
        rows
    }

    /// Left edges that recur across multi-span rows.
    fn detect_columns(&self, rows: &[SpanRow]) -> Vec<f32> {
        let multi: Vec<&SpanRow> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let sample: Vec<&SpanRow> = if multi.len() >= self.config.min_rows {
            multi
        } else {
            rows.iter().collect()
        };
        if sample.is_empty() {
            return Vec::new();
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &sample {
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.x / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((sample.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);
        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Runs of aligned, closely spaced rows with enough cells.
    fn find_table_regions(&self, rows: &[SpanRow], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = row.spans.len() >= self.config.min_columns
                && alignment_score(row, columns) >= self.config.min_alignment_ratio;
            let close = i > 0 && rows[i - 1].y - row.y <= self.config.edge_tol;

            if let Some(s) = start {
                if aligned && close {
                    continue;
                }
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
                start = None;
            }
            if aligned {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }
        regions
    }

    fn to_table(&self, rows: &[SpanRow], columns: &[f32]) -> Table {
        let right = rows
            .iter()
            .flat_map(|r| r.spans.iter())
            .map(TextSpan::right)
            .fold(f32::MIN, f32::max);

        let mut table = Table::new();
        for row in rows {
            let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in &row.spans {
                let col = find_column_for_span(span.x, columns, right);
                cells[col].push(span.text.trim());
            }
            table.add_row(cells.into_iter().map(|c| c.join(" ")).collect());
        }
        table
    }
}

fn make_row(spans: Vec<TextSpan>) -> SpanRow {
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    SpanRow { y, spans }
}

fn alignment_score(row: &SpanRow, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.x - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

/// Column whose span `[start - 10, next - 10)` holds `x`, else the nearest one.
fn find_column_for_span(x: f32, columns: &[f32], right: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Bulleted lists split into marker and text spans look like two columns.
fn is_list_pattern(rows: &[SpanRow], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }
    let bullets = rows
        .iter()
        .filter_map(|r| r.spans.first())
        .filter(|s| is_bullet_marker(&s.text))
        .count();
    bullets as f32 / rows.len() as f32 >= 0.5
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "►" | "■" | "●"
    )
}

/// Stream strategy over the embedded text layer.
#[derive(Debug, Clone, Default)]
pub struct StreamStrategy {
    config: StreamConfig,
}

impl StreamStrategy {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }
}

impl TableStrategy for StreamStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Stream
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn extract(&self, document: &Document, page_index: usize) -> Result<Option<Table>> {
        // page numbers are 1-indexed at this boundary
        let page_number = page_index + 1;
        let content = document.page_content_by_number(page_number)?;
        Ok(StreamDetector::new(self.config.clone()).detect(&content.spans))
    }
}
