//! Locating Form 1 pages by marker phrases.
//!
//! A page qualifies when enough distinct markers from a [`KeywordSet`] occur
//! in its normalized text. Embedded text is reliable, so the native locator
//! asks for more evidence than the OCR locator does.

mod auto;
mod native;
mod ocr;

pub use auto::AutoLocator;
pub use native::NativeTextLocator;
pub use ocr::OcrLocator;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Document;
use crate::normalize::normalize;
use crate::pipeline::CancellationToken;

/// Finds the pages of a document that carry the target form.
pub trait PageLocator {
    /// Matching page indices (0-indexed), ascending.
    fn locate(&self, document: &Document, cancel: &CancellationToken) -> Result<Vec<usize>>;
}

/// Ordered set of marker phrases, stored normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    markers: Vec<String>,
}

impl KeywordSet {
    /// Build a set from arbitrary phrases. Blank and duplicate phrases are dropped.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for marker in markers {
            let marker = normalize(marker.as_ref());
            if !marker.is_empty() && !out.contains(&marker) {
                out.push(marker);
            }
        }
        Self { markers: out }
    }

    /// The full Form 1 vocabulary.
    pub fn form1() -> Self {
        Self::new([
            "FORM 1",
            "ASSET CASES",
            "INDIVIDUAL ESTATE PROPERTY RECORD AND REPORT",
            "ASSET DESCRIPTION",
            "EXHIBIT A",
        ])
    }

    /// The Form 1 vocabulary without "EXHIBIT A".
    pub fn form1_core() -> Self {
        Self::new([
            "FORM 1",
            "ASSET CASES",
            "INDIVIDUAL ESTATE PROPERTY RECORD AND REPORT",
            "ASSET DESCRIPTION",
        ])
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Number of distinct markers present in already-normalized text.
    pub fn count_in(&self, normalized: &str) -> usize {
        self.markers
            .iter()
            .filter(|m| normalized.contains(m.as_str()))
            .count()
    }

    /// Normalize raw page text and count the markers in it.
    pub fn count_raw(&self, text: &str) -> usize {
        self.count_in(&normalize(text))
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::form1()
    }
}

/// How many distinct markers make a page qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchThreshold {
    /// Strictly more than `n` markers.
    MoreThan(usize),
    /// `n` markers or more.
    AtLeast(usize),
}

impl MatchThreshold {
    pub fn is_satisfied(&self, count: usize) -> bool {
        match *self {
            MatchThreshold::MoreThan(n) => count > n,
            MatchThreshold::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for MatchThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchThreshold::MoreThan(n) => write!(f, "> {}", n),
            MatchThreshold::AtLeast(n) => write!(f, ">= {}", n),
        }
    }
}
