//! PDF parsing module.

mod backend;
mod fonts;
mod layout;

pub use backend::{
    decode_text_simple, get_number_from_value, ContentOp, FormXObject, LopdfBackend, ObjectRef,
    PageId, PdfBackend, PdfValue, ResourceScope,
};
pub use fonts::FontMetrics;
pub use layout::{
    group_lines_into_blocks, group_spans_into_lines, LayoutAnalyzer, PageContent, Rule, TextLine,
    TextSpan,
};
