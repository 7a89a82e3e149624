//! Page rasterization.
//!
//! Pages are rendered by the poppler `pdftoppm` tool into a scratch
//! directory and decoded with `image`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;

use crate::config::RasterConfig;
use crate::error::{Error, Result};

/// Resolution tier a page is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpiTier {
    /// Keyword scan (default 144 DPI)
    Locator,
    /// Table extraction (default 300 DPI)
    Extraction,
}

/// Renders one page of a PDF file to an image.
pub trait Rasterizer {
    /// Render page `page_index` (0-indexed) of the PDF at `path`.
    fn rasterize(&self, path: &Path, page_index: usize, tier: DpiTier) -> Result<DynamicImage>;
}

/// [`Rasterizer`] that shells out to `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    command: PathBuf,
    locator_dpi: u32,
    extraction_dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(config: &RasterConfig) -> Self {
        Self {
            command: config.pdftoppm_cmd.clone(),
            locator_dpi: config.locator_dpi,
            extraction_dpi: config.extraction_dpi,
        }
    }

    pub fn dpi(&self, tier: DpiTier) -> u32 {
        match tier {
            DpiTier::Locator => self.locator_dpi,
            DpiTier::Extraction => self.extraction_dpi,
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(&RasterConfig::default())
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, path: &Path, page_index: usize, tier: DpiTier) -> Result<DynamicImage> {
        let dpi = self.dpi(tier);
        let page = (page_index + 1).to_string();
        log::debug!("Rendering page {} of {} at {} DPI", page, path.display(), dpi);

        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");

        let output = Command::new(&self.command)
            .arg("-r")
            .arg(dpi.to_string())
            .args(["-f", &page, "-l", &page])
            .args(["-png", "-singlefile"])
            .arg(path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| {
                Error::Raster(format!("failed to run {}: {}", self.command.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Raster(format!("pdftoppm failed: {}", stderr.trim())));
        }

        // -singlefile writes <prefix>.png without a page suffix
        let output_file = output_prefix.with_extension("png");
        if !output_file.exists() {
            return Err(Error::Raster(format!(
                "output file not found at {}",
                output_file.display()
            )));
        }

        let image = image::open(&output_file)?;
        log::debug!("Rendered {}x{}", image.width(), image.height());
        Ok(image)
    }
}
