//! Error types for the form1x library.

use std::io;
use thiserror::Error;

/// Result type alias for form1x operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while locating or extracting Form 1 tables.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not recognized as a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure or content streams.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Rendering a page to a raster image failed.
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// The OCR engine failed or produced unreadable output.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Image decoding, encoding or processing failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Writing CSV output failed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled through its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::Image(err.to_string()),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
