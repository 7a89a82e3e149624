//! OCR extraction with spatial binning into the fixed Form 1 grid.
//!
//! Column membership comes from the token's horizontal center relative to
//! the image width, row membership from `top / band_height`. Nothing about
//! the table's structure is inferred from the image itself.

use std::collections::BTreeMap;
use std::path::PathBuf;

use image::DynamicImage;

use crate::config::SpatialConfig;
use crate::error::Result;
use crate::model::{ColumnLayout, Document, ExtractionMethod, Table, TextBlock};
use crate::ocr::{preprocess, OcrEngine, OrientationCorrector};
use crate::raster::{DpiTier, Rasterizer};

use super::TableStrategy;

/// Asset Description cells containing these are repeated page furniture.
const NOISE_MARKERS: [&str; 3] = ["asset description", "form 1", "page:"];

/// Column holding the asset description.
const DESCRIPTION_COLUMN: usize = 1;

/// Bin OCR tokens into a table.
///
/// Tokens with a confidence at or below `min_confidence` or blank text are
/// discarded. Rows come out in ascending band order, cells join their tokens
/// with single spaces in encounter order, and blank or noise rows are dropped.
pub fn bin_tokens(
    tokens: &[TextBlock],
    image_width: f32,
    layout: &ColumnLayout,
    band_height: u32,
    min_confidence: f32,
) -> Table {
    let columns = layout.column_count();
    let band = band_height.max(1);
    let mut bands: BTreeMap<u32, Vec<Vec<&str>>> = BTreeMap::new();

    for token in tokens {
        let text = token.text.trim();
        if text.is_empty() || token.confidence.is_some_and(|c| c <= min_confidence) {
            continue;
        }
        let x = if image_width > 0.0 {
            token.bbox.center_x() / image_width
        } else {
            0.0
        };
        let col = layout.assign(x);
        let key = token.bbox.top.max(0.0) as u32 / band;
        bands.entry(key).or_insert_with(|| vec![Vec::new(); columns])[col].push(text);
    }

    let mut table = Table::form1();
    for cells in bands.into_values() {
        let row: Vec<String> = cells.into_iter().map(|c| c.join(" ")).collect();
        if !is_noise_row(&row) {
            table.add_row(row);
        }
    }
    table.drop_blank_rows();
    table
}

/// Header or footer text picked up as a row.
pub fn is_noise_row(row: &[String]) -> bool {
    row.get(DESCRIPTION_COLUMN).is_some_and(|cell| {
        let cell = cell.to_lowercase();
        NOISE_MARKERS.iter().any(|m| cell.contains(m))
    })
}

/// Renders the page, cleans it up and bins word-level OCR output.
pub struct SpatialOcrStrategy<'a> {
    rasterizer: &'a dyn Rasterizer,
    engine: &'a dyn OcrEngine,
    config: SpatialConfig,
    layout: ColumnLayout,
    debug_dir: Option<PathBuf>,
}

impl<'a> SpatialOcrStrategy<'a> {
    pub fn new(
        rasterizer: &'a dyn Rasterizer,
        engine: &'a dyn OcrEngine,
        config: SpatialConfig,
        debug_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            rasterizer,
            engine,
            config,
            layout: ColumnLayout::form1(),
            debug_dir,
        }
    }

    fn save_debug(&self, document: &Document, page_index: usize, image: &image::GrayImage) {
        let Some(dir) = &self.debug_dir else {
            return;
        };
        let path = dir.join(format!("{}_page_{}.png", document.file_name(), page_index + 1));
        let written = std::fs::create_dir_all(dir)
            .map_err(crate::Error::from)
            .and_then(|_| image.save(&path).map_err(crate::Error::from));
        match written {
            Ok(()) => log::debug!("Saved preprocessed page to {}", path.display()),
            Err(e) => log::warn!("Could not save debug image {}: {}", path.display(), e),
        }
    }
}

impl TableStrategy for SpatialOcrStrategy<'_> {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::SpatialOcr
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn extract(&self, document: &Document, page_index: usize) -> Result<Option<Table>> {
        log::info!("Running spatial OCR on page {}", page_index + 1);
        let image = self
            .rasterizer
            .rasterize(document.path(), page_index, DpiTier::Extraction)?;
        let image = OrientationCorrector::new(self.engine).correct(image);

        let cleaned = preprocess(&image);
        self.save_debug(document, page_index, &cleaned);

        let width = cleaned.width() as f32;
        let tokens = self
            .engine
            .recognize_tokens(&DynamicImage::ImageLuma8(cleaned), page_index)?;
        log::debug!("OCR returned {} tokens", tokens.len());

        let table = bin_tokens(
            &tokens,
            width,
            &self.layout,
            self.config.band_height,
            self.config.min_confidence,
        );
        Ok((!table.is_empty()).then_some(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, FORM1_HEADERS};

    fn token(text: &str, left: f32, top: f32, conf: f32) -> TextBlock {
        TextBlock::ocr(text, BoundingBox::new(left, top, 20.0, 12.0), conf, 0)
    }

    #[test]
    fn test_bins_rows_and_columns() {
        let tokens = vec![
            token("1", 10.0, 300.0, 90.0),
            token("Real", 200.0, 302.0, 91.0),
            token("Estate", 240.0, 301.0, 88.0),
            token("250,000", 500.0, 300.0, 95.0),
            token("2", 10.0, 330.0, 90.0),
            token("Car", 200.0, 331.0, 93.0),
        ];
        let table = bin_tokens(&tokens, 1000.0, &ColumnLayout::form1(), 15, 30.0);
        assert_eq!(table.headers.as_deref().map(|h| h.len()), Some(7));
        assert_eq!(table.headers.as_ref().unwrap()[0], FORM1_HEADERS[0]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0], vec!["1", "Real Estate", "", "250,000", "", "", ""]);
        assert_eq!(table.rows[1][1], "Car");
    }

    #[test]
    fn test_row_bands() {
        let layout = ColumnLayout::form1();
        let merged = bin_tokens(
            &[token("a", 10.0, 10.0, 90.0), token("b", 200.0, 14.0, 90.0)],
            1000.0,
            &layout,
            15,
            30.0,
        );
        assert_eq!(merged.row_count(), 1);

        let split = bin_tokens(
            &[token("a", 10.0, 14.0, 90.0), token("b", 200.0, 16.0, 90.0)],
            1000.0,
            &layout,
            15,
            30.0,
        );
        assert_eq!(split.row_count(), 2);
    }

    #[test]
    fn test_low_confidence_and_blank_tokens_dropped() {
        let tokens = vec![
            token("noise", 200.0, 100.0, 30.0),
            token("  ", 200.0, 100.0, 99.0),
            token("kept", 200.0, 200.0, 30.5),
        ];
        let table = bin_tokens(&tokens, 1000.0, &ColumnLayout::form1(), 15, 30.0);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][1], "kept");
    }

    #[test]
    fn test_noise_rows_filtered() {
        let tokens = vec![
            token("Asset", 100.0, 50.0, 90.0),
            token("Description", 160.0, 50.0, 90.0),
            token("FORM", 100.0, 80.0, 90.0),
            token("1", 150.0, 80.0, 90.0),
            token("Page:", 100.0, 110.0, 90.0),
            token("Boat", 100.0, 140.0, 90.0),
        ];
        let table = bin_tokens(&tokens, 1000.0, &ColumnLayout::form1(), 15, 30.0);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][1], "Boat");
    }

    #[test]
    fn test_no_tokens_is_empty() {
        let table = bin_tokens(&[], 1000.0, &ColumnLayout::form1(), 15, 30.0);
        assert!(table.is_empty());
    }
}
