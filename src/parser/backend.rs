//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the page-level PDF operations the
//! locators and extractors need, isolating the concrete PDF library (lopdf)
//! from the layout analysis logic.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};

use super::fonts::FontMetrics;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Indirect object identifier.
pub type ObjectRef = (u32, u16);

/// Inheritance chains deeper than this are treated as malformed.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Where a content stream looks up its named resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    Page(PageId),
    /// A form XObject drawn on `page`. Names missing from the form's own
    /// resources are looked up on the page.
    Form { form: ObjectRef, page: PageId },
}

impl ResourceScope {
    /// The page this scope is drawn on.
    pub fn page(&self) -> PageId {
        match *self {
            ResourceScope::Page(page) | ResourceScope::Form { page, .. } => page,
        }
    }
}

/// A form XObject ready to be interpreted.
#[derive(Debug, Clone)]
pub struct FormXObject {
    /// Scope for the form's own content.
    pub scope: ResourceScope,
    /// `/Matrix`, form space to the user space of the invoking stream.
    pub matrix: [f32; 6],
    /// Decompressed content stream.
    pub content: Vec<u8>,
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, content stream decoding, text
/// decoding and the handful of page attributes the pipeline reads, without
/// exposing any concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (1-based page number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the raw (decompressed) content stream bytes for a page.
    /// A page without `/Contents` yields an empty buffer.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the named font's encoding.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String;

    /// Glyph widths of the named font.
    fn font_metrics(&self, scope: ResourceScope, font_name: &[u8]) -> FontMetrics;

    /// Resolve a `Do` operand to a form XObject. Images and unknown names
    /// yield `None`.
    fn form_xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<FormXObject>;

    /// Page rotation in degrees, normalized to 0, 90, 180 or 270.
    fn page_rotation(&self, page: PageId) -> u16;

    /// Page media box as (x0, y0, x1, y1) in points.
    fn page_media_box(&self, page: PageId) -> (f32, f32, f32, f32);

    /// Number of image XObjects referenced by the page resources.
    fn page_image_count(&self, page: PageId) -> usize;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend — concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Encrypted documents are opened with the empty user password.
    fn from_document(mut doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            if let Err(e) = doc.decrypt("") {
                log::debug!("Empty password rejected: {}", e);
                return Err(Error::Encrypted);
            }
            log::debug!("Decrypted document with the empty password");
        }
        Ok(Self { doc })
    }

    /// Follow a single indirect reference.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(obj).and_then(|o| o.as_dict().ok())
    }

    /// Look up an inheritable page attribute (`/Rotate`, `/MediaBox`,
    /// `/Resources`), walking up the `/Parent` chain.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            let parent = dict.get(b"Parent").ok()?;
            dict = self.resolve_dict(parent)?;
        }
        None
    }

    fn resources(&self, scope: ResourceScope) -> Option<&Dictionary> {
        match scope {
            ResourceScope::Page(page) => self
                .inherited(page, b"Resources")
                .and_then(|o| o.as_dict().ok()),
            ResourceScope::Form { form, .. } => {
                let stream = self.doc.get_object(form).ok()?.as_stream().ok()?;
                self.resolve_dict(stream.dict.get(b"Resources").ok()?)
            }
        }
    }

    /// Unresolved entry `name` of resource category `category` (`/Font`,
    /// `/XObject`), falling back from a form to its page.
    fn resource(&self, scope: ResourceScope, category: &[u8], name: &[u8]) -> Option<&Object> {
        let local = self
            .resources(scope)
            .and_then(|r| r.get(category).ok())
            .and_then(|o| self.resolve_dict(o))
            .and_then(|d| d.get(name).ok());
        match (local, scope) {
            (Some(obj), _) => Some(obj),
            (None, ResourceScope::Form { page, .. }) => {
                self.resource(ResourceScope::Page(page), category, name)
            }
            (None, ResourceScope::Page(_)) => None,
        }
    }

    fn font_dict(&self, scope: ResourceScope, name: &[u8]) -> Option<&Dictionary> {
        self.resource(scope, b"Font", name)
            .and_then(|o| self.resolve_dict(o))
    }

    fn number(&self, obj: &Object) -> Option<f32> {
        self.resolve(obj).and_then(object_number)
    }

    fn numbers(&self, obj: &Object) -> Vec<f32> {
        match self.resolve(obj) {
            Some(Object::Array(values)) => values.iter().filter_map(|v| self.number(v)).collect(),
            _ => Vec::new(),
        }
    }

    fn metrics_for(&self, font: &Dictionary) -> FontMetrics {
        let subtype = font.get(b"Subtype").and_then(Object::as_name).unwrap_or_default();
        if subtype == b"Type0" {
            return self.composite_metrics(font);
        }

        if let Ok(widths) = font.get(b"Widths") {
            let widths = self.numbers(widths);
            if !widths.is_empty() {
                let first_char = font
                    .get(b"FirstChar")
                    .ok()
                    .and_then(|o| self.number(o))
                    .unwrap_or(0.0) as u32;
                let missing_width = font
                    .get(b"FontDescriptor")
                    .ok()
                    .and_then(|o| self.resolve_dict(o))
                    .and_then(|d| d.get(b"MissingWidth").ok())
                    .and_then(|o| self.number(o))
                    .unwrap_or(0.0);
                return FontMetrics::simple(first_char, &widths, missing_width);
            }
        }

        font.get(b"BaseFont")
            .and_then(Object::as_name_str)
            .ok()
            .and_then(FontMetrics::standard)
            .unwrap_or_default()
    }

    /// `/DW` and `/W` of the first descendant font. `/W` mixes
    /// `c [w1 w2 ...]` and `c_first c_last w` runs.
    fn composite_metrics(&self, font: &Dictionary) -> FontMetrics {
        let descendant = font
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .and_then(|a| a.first())
            .and_then(|o| self.resolve_dict(o));
        let Some(descendant) = descendant else {
            return FontMetrics::composite(BTreeMap::new(), 1000.0);
        };

        let default_width = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| self.number(o))
            .unwrap_or(1000.0);

        let mut widths = BTreeMap::new();
        let entries: Vec<&Object> = match descendant.get(b"W").ok().and_then(|o| self.resolve(o)) {
            Some(Object::Array(items)) => items.iter().filter_map(|o| self.resolve(o)).collect(),
            _ => Vec::new(),
        };
        let mut i = 0;
        while i < entries.len() {
            let Some(first) = object_number(entries[i]) else {
                break;
            };
            match entries.get(i + 1) {
                Some(Object::Array(run)) => {
                    for (offset, w) in run.iter().filter_map(|o| self.number(o)).enumerate() {
                        widths.insert(first as u32 + offset as u32, w);
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(w)) = (
                        object_number(last),
                        entries.get(i + 2).and_then(|o| object_number(o)),
                    ) else {
                        break;
                    };
                    for code in first as u32..=last as u32 {
                        widths.insert(code, w);
                    }
                    i += 3;
                }
                None => break,
            }
        }
        FontMetrics::composite(widths, default_width)
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(Vec::new()),
        };

        match self.resolve(contents) {
            Some(Object::Stream(s)) => s
                .decompressed_content()
                .or_else(|_| Ok(s.content.clone())),
            Some(Object::Array(arr)) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(Object::Stream(s)) = self.resolve(obj) {
                        match s.decompressed_content() {
                            Ok(data) => content.extend_from_slice(&data),
                            Err(_) => content.extend_from_slice(&s.content),
                        }
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String {
        if let Some(font_dict) = self.font_dict(scope, font_name) {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn font_metrics(&self, scope: ResourceScope, font_name: &[u8]) -> FontMetrics {
        self.font_dict(scope, font_name)
            .map(|font| self.metrics_for(font))
            .unwrap_or_default()
    }

    fn form_xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<FormXObject> {
        let Some(Object::Reference(id)) = self.resource(scope, b"XObject", name) else {
            return None;
        };
        let stream = self.doc.get_object(*id).ok()?.as_stream().ok()?;
        if stream.dict.get(b"Subtype").and_then(Object::as_name).ok()? != b"Form" {
            return None;
        }

        let mut matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        if let Ok(values) = stream.dict.get(b"Matrix") {
            let values = self.numbers(values);
            if values.len() == 6 {
                matrix.copy_from_slice(&values);
            }
        }
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        Some(FormXObject {
            scope: ResourceScope::Form {
                form: *id,
                page: scope.page(),
            },
            matrix,
            content,
        })
    }

    fn page_rotation(&self, page: PageId) -> u16 {
        let degrees = self
            .inherited(page, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        degrees.rem_euclid(360) as u16 / 90 * 90
    }

    fn page_media_box(&self, page: PageId) -> (f32, f32, f32, f32) {
        let letter = (0.0, 0.0, 612.0, 792.0);
        let Some(Object::Array(values)) = self.inherited(page, b"MediaBox") else {
            return letter;
        };
        let numbers: Vec<f32> = values
            .iter()
            .filter_map(|v| self.resolve(v))
            .filter_map(object_number)
            .collect();
        if numbers.len() < 4 {
            return letter;
        }
        (
            numbers[0].min(numbers[2]),
            numbers[1].min(numbers[3]),
            numbers[0].max(numbers[2]),
            numbers[1].max(numbers[3]),
        )
    }

    fn page_image_count(&self, page: PageId) -> usize {
        let Some(resources) = self.resources(ResourceScope::Page(page)) else {
            return 0;
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| self.resolve_dict(o))
        else {
            return 0;
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| match self.resolve(obj) {
                Some(Object::Stream(stream)) => Some(stream),
                _ => None,
            })
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .count()
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

fn object_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}
