//! Pipeline configuration.
//!
//! Every section has working defaults, so a JSON file only needs the values it
//! overrides:
//!
//! ```
//! use form1x::config::Config;
//!
//! let config = Config::from_json_str(r#"{ "ocr": { "tesseract_cmd": "/opt/tess/bin/tesseract" } }"#)?;
//! assert_eq!(config.ocr.language, "eng");
//! # Ok::<(), form1x::Error>(())
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::locate::{KeywordSet, MatchThreshold};

/// Top-level configuration for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page locator settings
    pub locator: LocatorConfig,
    /// Text/image page classifier settings
    pub classifier: ClassifierConfig,
    /// Table extraction strategy chain
    pub extractor: ExtractorConfig,
    /// OCR engine settings
    pub ocr: OcrConfig,
    /// Page rasterizer settings
    pub raster: RasterConfig,
    /// Output locations
    pub output: OutputConfig,
}

impl Config {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check values that would make the pipeline misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.locator.keywords.is_empty() {
            return Err(Error::Config("keyword list is empty".to_string()));
        }
        if self.extractor.spatial.band_height == 0 {
            return Err(Error::Config("spatial band_height must be > 0".to_string()));
        }
        if self.raster.locator_dpi == 0 || self.raster.extraction_dpi == 0 {
            return Err(Error::Config("raster DPI must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.classifier.text_ratio_threshold) {
            return Err(Error::Config(
                "classifier text_ratio_threshold must be within 0..=1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the locator mode.
    pub fn with_locator_mode(mut self, mode: LocatorMode) -> Self {
        self.locator.mode = mode;
        self
    }

    /// Replace the marker vocabulary.
    pub fn with_keywords(mut self, keywords: KeywordSet) -> Self {
        self.locator.keywords = keywords.markers().to_vec();
        self
    }

    /// Set the output directory for extracted tables.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.output_dir = dir.into();
        self
    }

    /// Set the directory for preprocessed OCR images.
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.debug_dir = Some(dir.into());
        self
    }

    /// Do not write preprocessed OCR images.
    pub fn without_debug_dir(mut self) -> Self {
        self.output.debug_dir = None;
        self
    }

    /// Set the run log path.
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.log_path = path.into();
        self
    }

    /// Set the tesseract executable.
    pub fn with_tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.ocr.tesseract_cmd = cmd.into();
        self
    }

    /// Set the pdftoppm executable.
    pub fn with_pdftoppm_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.raster.pdftoppm_cmd = cmd.into();
        self
    }

    /// Enable or disable the spatial OCR fallback at the end of the chain.
    pub fn with_ocr_fallback(mut self, enabled: bool) -> Self {
        self.extractor.spatial.enabled = enabled;
        self
    }

    /// Build the keyword set from the configured markers.
    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::new(self.locator.keywords.iter().cloned())
    }
}

/// How pages are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorMode {
    /// Embedded text only
    #[default]
    Native,
    /// OCR of image-bearing pages only
    Ocr,
    /// Embedded text first, OCR for image-heavy pages that did not match
    Auto,
}

/// Page locator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Which locator strategy to run
    pub mode: LocatorMode,
    /// Marker phrases, compared after normalization
    pub keywords: Vec<String>,
    /// Match rule for embedded text
    pub native_threshold: MatchThreshold,
    /// Match rule for OCR text (noisier, so usually lower)
    pub ocr_threshold: MatchThreshold,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            mode: LocatorMode::Native,
            keywords: KeywordSet::form1().markers().to_vec(),
            native_threshold: MatchThreshold::MoreThan(3),
            ocr_threshold: MatchThreshold::AtLeast(2),
        }
    }
}

/// Page classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Area (in square points) counted for every embedded image
    pub image_area_proxy: f32,
    /// Pages with a text ratio above this are machine-readable
    pub text_ratio_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            image_area_proxy: 50_000.0,
            text_ratio_threshold: 0.6,
        }
    }
}

/// Strategy chain settings, in chain order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub stream: StreamConfig,
    pub lattice: LatticeConfig,
    pub text_layout: TextLayoutConfig,
    pub spatial: SpatialConfig,
}

/// Borderless (text alignment) table detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub enabled: bool,
    /// Largest vertical gap (points) between two rows of the same table
    pub edge_tol: f32,
    /// Vertical tolerance (points) for merging text into one row
    pub row_tol: f32,
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_tol: 100.0,
            row_tol: 10.0,
            min_rows: 2,
            min_columns: 2,
            max_columns: 12,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Bordered table detection from ruling lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    pub enabled: bool,
    /// Rules closer than this (points) are treated as one
    pub line_tol: f32,
    /// Thickest filled rectangle still read as a rule (points)
    pub max_rule_thickness: f32,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            line_tol: 2.0,
            max_rule_thickness: 3.0,
        }
    }
}

/// Generic line-based fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayoutConfig {
    pub enabled: bool,
    /// Vertical tolerance (points) for merging text into one line
    pub row_tol: f32,
    /// Horizontal gap (points) that starts a new cell
    pub min_gap: f32,
    /// Lines with fewer cells than this are not table rows
    pub min_cells: usize,
}

impl Default for TextLayoutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            row_tol: 3.0,
            min_gap: 12.0,
            min_cells: 2,
        }
    }
}

/// OCR with spatial binning into the fixed Form 1 grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub enabled: bool,
    /// Row band height in pixels at extraction DPI
    pub band_height: u32,
    /// Tokens at or below this confidence are discarded
    pub min_confidence: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            band_height: 15,
            min_confidence: 30.0,
        }
    }
}

/// OCR engine settings, handed to the engine at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// tesseract executable (name on PATH or absolute path)
    pub tesseract_cmd: PathBuf,
    /// Recognition language(s), e.g. "eng" or "eng+spa"
    pub language: String,
    /// Page segmentation mode; 6 assumes a uniform block of text
    pub page_segmentation_mode: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

/// Page rasterizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// pdftoppm executable (name on PATH or absolute path)
    pub pdftoppm_cmd: PathBuf,
    /// DPI for the keyword scan
    pub locator_dpi: u32,
    /// DPI for table extraction
    pub extraction_dpi: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            locator_dpi: 144,
            extraction_dpi: 300,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One CSV per source document lands here
    pub output_dir: PathBuf,
    /// Preprocessed OCR page images; `None` disables them
    pub debug_dir: Option<PathBuf>,
    /// Run log CSV
    pub log_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            debug_dir: Some(PathBuf::from("./ocr_debug")),
            log_path: PathBuf::from("extraction_log.csv"),
        }
    }
}
