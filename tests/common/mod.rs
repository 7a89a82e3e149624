//! Shared fixtures: synthetic PDFs built with lopdf, plus in-memory OCR and
//! rasterizer stand-ins.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use form1x::model::{BoundingBox, TextBlock};
use form1x::parser::FontMetrics;
use form1x::{DpiTier, OcrEngine, Rasterizer};
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// One piece of text placed at (x, y) in points.
#[derive(Clone)]
pub struct Text {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub text: String,
}

pub fn text(x: f32, y: f32, s: &str) -> Text {
    Text {
        x,
        y,
        size: 8.0,
        text: s.to_string(),
    }
}

/// Page description for [`build_pdf`].
#[derive(Clone, Default)]
pub struct PageSpec {
    pub texts: Vec<Text>,
    pub with_image: bool,
    /// Place every glyph with its own `Tm`, the way typesetters that
    /// kern or justify emit text.
    pub per_glyph: bool,
    /// Draw the text from a form XObject carrying its own font resources.
    pub in_form: bool,
}

/// Vertical offset undone by the form XObject's `/Matrix`.
const FORM_SHIFT: f32 = 100.0;

fn text_operations(spec: &PageSpec, y_shift: f32) -> Vec<Operation> {
    let helvetica = FontMetrics::standard("Helvetica").expect("helvetica widths");
    let mut operations = Vec::new();
    for t in &spec.texts {
        let y = t.y + y_shift;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), t.size.into()]));
        if spec.per_glyph {
            let mut x = t.x;
            for byte in t.text.bytes() {
                operations.push(Operation::new(
                    "Tm",
                    vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(vec![byte])],
                ));
                x += helvetica.width(byte as u32) / 1000.0 * t.size;
            }
        } else {
            operations.push(Operation::new("Td", vec![t.x.into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(t.text.as_str())],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

/// Build a PDF with Letter pages, Helvetica text and optional image XObjects.
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for spec in pages {
        let mut xobjects = lopdf::Dictionary::new();
        let mut operations = Vec::new();
        if spec.in_form {
            let form = Content {
                operations: text_operations(spec, FORM_SHIFT),
            };
            let form_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                    "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), (-FORM_SHIFT).into()],
                    "Resources" => dictionary! {
                        "Font" => dictionary! { "F1" => font_id },
                    },
                },
                form.encode().expect("encode form"),
            ));
            xobjects.set("Fm0", form_id);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new("Do", vec!["Fm0".into()]));
            operations.push(Operation::new("Q", vec![]));
        } else {
            operations.extend(text_operations(spec, 0.0));
        }
        if spec.with_image {
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    612.into(),
                    0.into(),
                    0.into(),
                    792.into(),
                    0.into(),
                    0.into(),
                ],
            ));
            operations.push(Operation::new("Do", vec!["Im1".into()]));
            operations.push(Operation::new("Q", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));

        let mut resources = lopdf::Dictionary::new();
        if !spec.in_form {
            resources.set("Font", dictionary! { "F1" => font_id });
        }
        if spec.with_image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 1,
                    "Height" => 1,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![255],
            ));
            xobjects.set("Im1", image_id);
        }
        if !xobjects.is_empty() {
            resources.set("XObject", xobjects);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

pub fn write_pdf(dir: &Path, name: &str, pages: &[PageSpec]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).expect("write pdf");
    path
}

/// Title lines carrying four distinct markers, one span each.
pub fn form1_titles() -> Vec<Text> {
    vec![
        text(250.0, 750.0, "FORM 1"),
        text(150.0, 730.0, "INDIVIDUAL ESTATE PROPERTY RECORD AND REPORT"),
        text(250.0, 710.0, "ASSET CASES"),
        text(120.0, 690.0, "(Scheduled and Unscheduled Property) Asset Description"),
    ]
}

/// Five asset rows across seven aligned columns.
pub fn form1_rows() -> Vec<Text> {
    let assets = [
        ("1", "Real estate 12 Main St", "250,000.00", "200,000.00", "No", "0.00", "No"),
        ("2", "2015 Honda Civic", "8,000.00", "3,500.00", "Yes", "0.00", "Yes"),
        ("3", "Checking account", "1,200.00", "1,200.00", "No", "1,200.00", "Yes"),
        ("4", "Household goods", "2,000.00", "0.00", "Yes", "0.00", "Yes"),
        ("5", "Tax refund 2023", "3,100.00", "3,100.00", "No", "3,100.00", "No"),
    ];
    let xs = [40.0, 80.0, 250.0, 330.0, 400.0, 450.0, 530.0];

    let mut out = Vec::new();
    for (i, asset) in assets.iter().enumerate() {
        let y = 600.0 - i as f32 * 20.0;
        let cells = [asset.0, asset.1, asset.2, asset.3, asset.4, asset.5, asset.6];
        for (x, cell) in xs.iter().zip(cells) {
            out.push(text(*x, y, cell));
        }
    }
    out
}

/// A machine-readable Form 1 page.
pub fn form1_page() -> PageSpec {
    let mut texts = form1_titles();
    texts.extend(form1_rows());
    PageSpec {
        texts,
        ..Default::default()
    }
}

pub fn prose_page(lines: &[&str]) -> PageSpec {
    PageSpec {
        texts: lines
            .iter()
            .enumerate()
            .map(|(i, l)| text(72.0, 700.0 - i as f32 * 14.0, l))
            .collect(),
        ..Default::default()
    }
}

pub fn scanned_page() -> PageSpec {
    PageSpec {
        with_image: true,
        ..Default::default()
    }
}

/// Rasterizer returning a blank page of fixed size and counting calls.
pub struct BlankRasterizer {
    pub width: u32,
    pub height: u32,
    pub calls: Rc<Cell<usize>>,
}

impl BlankRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl Rasterizer for BlankRasterizer {
    fn rasterize(
        &self,
        _path: &Path,
        _page_index: usize,
        _tier: DpiTier,
    ) -> form1x::Result<DynamicImage> {
        self.calls.set(self.calls.get() + 1);
        Ok(DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            self.width,
            self.height,
            image::Luma([255]),
        )))
    }
}

/// OCR engine with canned answers.
#[derive(Default)]
pub struct ScriptedOcr {
    pub text: String,
    pub tokens: Vec<TextBlock>,
    pub osd: Option<String>,
}

impl OcrEngine for ScriptedOcr {
    fn recognize_text(&self, _image: &DynamicImage) -> form1x::Result<String> {
        Ok(self.text.clone())
    }

    fn recognize_tokens(&self, _image: &DynamicImage, page: usize) -> form1x::Result<Vec<TextBlock>> {
        Ok(self
            .tokens
            .iter()
            .cloned()
            .map(|mut t| {
                t.page = page;
                t
            })
            .collect())
    }

    fn detect_orientation(&self, _image: &DynamicImage) -> form1x::Result<String> {
        self.osd
            .clone()
            .ok_or_else(|| form1x::Error::Ocr("osd unavailable".to_string()))
    }
}

pub fn token(text: &str, left: f32, top: f32, conf: f32) -> TextBlock {
    TextBlock::ocr(text, BoundingBox::new(left, top, 20.0, 12.0), conf, 0)
}

/// Re-save `bytes` behind the standard security handler with an empty user
/// password. Versions other than 1 and 2 cannot be opened by the reader.
pub fn encrypt_pdf(bytes: &[u8], version: i64) -> Vec<u8> {
    let mut doc = Document::load_mem(bytes).expect("load pdf");
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => version,
        "R" => 2,
        "Length" => 40,
        "O" => Object::string_literal(vec![0x5Au8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let file_id = Object::string_literal(b"form1x fixture id".to_vec());
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    // RC4 is symmetric, so decrypting plaintext encrypts it.
    if let Ok(key) = lopdf::encryption::get_encryption_key(&doc, "", false) {
        for (&id, obj) in doc.objects.iter_mut() {
            if id == encrypt_id {
                continue;
            }
            let Ok(cipher) = lopdf::encryption::decrypt_object(&key, id, &*obj) else {
                continue;
            };
            match obj {
                Object::Stream(stream) => stream.set_content(cipher),
                Object::String(content, _) => *content = cipher,
                _ => {}
            }
        }
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save pdf");
    out
}

/// Rasterizer that fails for the listed page indices.
pub struct FlakyRasterizer {
    pub failing: Vec<usize>,
}

impl Rasterizer for FlakyRasterizer {
    fn rasterize(
        &self,
        _path: &Path,
        page_index: usize,
        _tier: DpiTier,
    ) -> form1x::Result<DynamicImage> {
        if self.failing.contains(&page_index) {
            return Err(form1x::Error::Raster(format!("page {} unreadable", page_index)));
        }
        Ok(DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            40,
            40,
            image::Luma([255]),
        )))
    }
}
