//! Data model shared by the locators, the extractors and the pipeline.

mod document;
mod page;
mod report;
mod table;

pub use document::{is_pdf, Document};
pub use page::{BoundingBox, PageInfo, TextBlock};
pub use report::{PageLog, PageStatus, RunReport};
pub use table::{ColumnLayout, ExtractionMethod, ExtractionResult, Table, FORM1_HEADERS};
