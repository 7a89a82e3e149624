//! Document handle.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::parser::{
    group_lines_into_blocks, group_spans_into_lines, LayoutAnalyzer, LopdfBackend, PageContent,
    PageId, PdfBackend,
};

use super::{BoundingBox, PageInfo, TextBlock};

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Baseline tolerance used when rebuilding text lines.
const LINE_TOLERANCE: f32 = 3.0;

/// Check whether a byte slice starts with a PDF header.
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// An open PDF document.
///
/// The file is parsed once; every page-level query reads from the same
/// in-memory object graph, which is released when the value drops.
pub struct Document {
    path: PathBuf,
    backend: LopdfBackend,
    page_ids: Vec<PageId>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("pages", &self.page_ids.len())
            .finish()
    }
}

impl Document {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut header = [0u8; 8];
        let read = File::open(path)?.read(&mut header)?;
        if !is_pdf(&header[..read]) {
            return Err(Error::UnknownFormat);
        }

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self::from_backend(path.to_path_buf(), backend))
    }

    /// Open a PDF held in memory; `name` stands in for the file path.
    pub fn from_bytes(name: impl Into<PathBuf>, data: &[u8]) -> Result<Self> {
        if !is_pdf(data) {
            return Err(Error::UnknownFormat);
        }
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self::from_backend(name.into(), backend))
    }

    fn from_backend(path: PathBuf, backend: LopdfBackend) -> Self {
        let page_ids = backend.pages().into_values().collect();
        Self {
            path,
            backend,
            page_ids,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_id(&self, index: usize) -> Result<PageId> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(Error::PageOutOfRange(index, self.page_ids.len()))
    }

    /// Static attributes of a page (0-indexed).
    pub fn page_info(&self, index: usize) -> Result<PageInfo> {
        let id = self.page_id(index)?;
        let (x0, y0, x1, y1) = self.backend.page_media_box(id);
        Ok(PageInfo {
            index,
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
            rotation: self.backend.page_rotation(id),
            image_count: self.backend.page_image_count(id),
        })
    }

    /// Positioned spans and ruling lines of a page (0-indexed).
    pub fn page_content(&self, index: usize) -> Result<PageContent> {
        let id = self.page_id(index)?;
        LayoutAnalyzer::new(&self.backend).extract_page(id)
    }

    /// Same as [`Document::page_content`], addressed by 1-indexed page number.
    pub fn page_content_by_number(&self, number: usize) -> Result<PageContent> {
        if number == 0 {
            return Err(Error::PageOutOfRange(0, self.page_count()));
        }
        self.page_content(number - 1)
    }

    /// Embedded text of a page in reading order, one line per text line.
    pub fn page_text(&self, index: usize) -> Result<String> {
        let content = self.page_content(index)?;
        let lines = group_spans_into_lines(&content.spans, LINE_TOLERANCE);
        Ok(lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Embedded text grouped into blocks, with boxes in top-left page coordinates.
    pub fn text_blocks(&self, index: usize) -> Result<Vec<TextBlock>> {
        let info = self.page_info(index)?;
        let content = self.page_content(index)?;
        let lines = group_spans_into_lines(&content.spans, LINE_TOLERANCE);

        Ok(group_lines_into_blocks(lines)
            .into_iter()
            .map(|block| {
                let left = block.iter().map(|l| l.x).fold(f32::MAX, f32::min);
                let right = block.iter().map(|l| l.right()).fold(f32::MIN, f32::max);
                let top = block.iter().map(|l| l.top()).fold(f32::MIN, f32::max);
                let bottom = block.iter().map(|l| l.bottom()).fold(f32::MAX, f32::min);
                let text = block
                    .iter()
                    .map(|l| l.text())
                    .collect::<Vec<_>>()
                    .join("\n");
                let bbox = BoundingBox::new(left, info.height - top, right - left, top - bottom);
                TextBlock::native(text, bbox, index)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.7\n"));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let err = Document::from_bytes("x.pdf", b"hello world").unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(matches!(Document::open(&path), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Document::open("/nonexistent/form1x/missing.pdf").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
