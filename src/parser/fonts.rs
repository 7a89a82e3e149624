//! Glyph width metrics.
//!
//! Widths are in glyph space units (1/1000 of text space). They come from a
//! font's `/Widths` (or `/W` for CID fonts); fonts without explicit widths
//! fall back to built-in tables for the standard faces, then to a flat
//! half-em default.

use std::collections::BTreeMap;

/// Width used when nothing better is known.
const DEFAULT_WIDTH: f32 = 500.0;

/// Character widths for one font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Bytes per character code: 1 for simple fonts, 2 for CID fonts.
    code_width: usize,
    widths: BTreeMap<u32, f32>,
    default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            code_width: 1,
            widths: BTreeMap::new(),
            default_width: DEFAULT_WIDTH,
        }
    }
}

impl FontMetrics {
    /// Simple font: `widths[i]` is the width of code `first_char + i`.
    pub fn simple(first_char: u32, widths: &[f32], missing_width: f32) -> Self {
        Self {
            code_width: 1,
            widths: widths
                .iter()
                .enumerate()
                .map(|(i, w)| (first_char + i as u32, *w))
                .collect(),
            default_width: missing_width,
        }
    }

    /// Composite (Type0) font with two-byte codes.
    pub fn composite(widths: BTreeMap<u32, f32>, default_width: f32) -> Self {
        Self {
            code_width: 2,
            widths,
            default_width,
        }
    }

    /// Built-in widths for a standard face, matched loosely by base font name.
    ///
    /// Subset tags (`ABCDEF+`) are ignored, Arial maps to Helvetica and
    /// Times New Roman to Times. Italic faces use their upright widths.
    pub fn standard(base_font: &str) -> Option<Self> {
        let name = match base_font.split_once('+') {
            Some((tag, rest)) if tag.len() == 6 => rest,
            _ => base_font,
        };
        let key: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        let bold = key.contains("bold");

        let (table, default_width) = if key.starts_with("courier") {
            (&COURIER, 600.0)
        } else if key.starts_with("helvetica") || key.starts_with("arial") {
            if bold {
                (&HELVETICA_BOLD, 556.0)
            } else {
                (&HELVETICA, 556.0)
            }
        } else if key.starts_with("times") {
            if bold {
                (&TIMES_BOLD, 500.0)
            } else {
                (&TIMES_ROMAN, 500.0)
            }
        } else {
            return None;
        };

        Some(Self {
            code_width: 1,
            widths: table
                .iter()
                .enumerate()
                .map(|(i, w)| (FIRST_PRINTABLE + i as u32, *w as f32))
                .collect(),
            default_width,
        })
    }

    /// Whether codes are single bytes (word spacing only applies then).
    pub fn is_single_byte(&self) -> bool {
        self.code_width == 1
    }

    /// Split a shown string into character codes.
    pub fn codes<'b>(&self, bytes: &'b [u8]) -> impl Iterator<Item = u32> + 'b {
        bytes
            .chunks(self.code_width)
            .map(|chunk| chunk.iter().fold(0u32, |code, b| (code << 8) | *b as u32))
    }

    /// Width of one code in glyph space units.
    pub fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }
}

/// Tables below start at the space character and end at `~`.
const FIRST_PRINTABLE: u32 = 32;

static COURIER: [u16; 95] = [600; 95];

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9 : ; < = > ?
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // @ A-O
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // P-Z [ \ ] ^ _
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // ` a-o
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // p-z { | } ~
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];
