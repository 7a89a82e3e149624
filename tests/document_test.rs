mod common;

use common::*;
use form1x::locate::NativeTextLocator;
use form1x::{CancellationToken, Document, Error, PageClassifier, PageKind, PageLocator};

#[test]
fn test_page_info_and_text() {
    let bytes = build_pdf(&[form1_page(), scanned_page()]);
    let doc = Document::from_bytes("filing.pdf", &bytes).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.file_name(), "filing.pdf");
    assert_eq!(doc.stem(), "filing");

    let info = doc.page_info(0).unwrap();
    assert_eq!(info.width, 612.0);
    assert_eq!(info.height, 792.0);
    assert_eq!(info.image_count, 0);
    assert_eq!(doc.page_info(1).unwrap().image_count, 1);

    let text = doc.page_text(0).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "FORM 1");
    assert_eq!(lines[1], "INDIVIDUAL ESTATE PROPERTY RECORD AND REPORT");
    assert!(lines[4].starts_with("1 Real estate 12 Main St"));

    assert!(doc.page_text(1).unwrap().is_empty());
}

#[test]
fn test_page_out_of_range() {
    let doc = Document::from_bytes("one.pdf", &build_pdf(&[prose_page(&["a"])])).unwrap();
    assert!(matches!(doc.page_info(3), Err(Error::PageOutOfRange(3, 1))));
    assert!(doc.page_content_by_number(0).is_err());
    assert_eq!(doc.page_content_by_number(1).unwrap().spans.len(), 1);
}

#[test]
fn test_text_blocks_use_top_left_origin() {
    let doc = Document::from_bytes("p.pdf", &build_pdf(&[prose_page(&["First line"])])).unwrap();
    let blocks = doc.text_blocks(0).unwrap();

    assert_eq!(blocks.len(), 1);
    let block = &blocks[0];
    assert_eq!(block.text, "First line");
    assert_eq!(block.page, 0);
    assert!(block.confidence.is_none());
    assert!((block.bbox.left - 72.0).abs() < 0.01);
    // Baseline at 700, ascent 0.8 of the 8pt font.
    assert!((block.bbox.top - 85.6).abs() < 0.01);
}

#[test]
fn test_classify_text_and_scanned_pages() {
    let doc = Document::from_bytes("mix.pdf", &build_pdf(&[form1_page(), scanned_page()])).unwrap();
    let classifier = PageClassifier::default();

    assert_eq!(classifier.classify_page(&doc, 0).unwrap().kind, PageKind::Text);
    assert_eq!(classifier.classify_page(&doc, 1).unwrap().kind, PageKind::Image);
}

#[test]
fn test_native_locator_reports_every_matching_page() {
    let doc = Document::from_bytes(
        "multi.pdf",
        &build_pdf(&[form1_page(), prose_page(&["Exhibit A"]), form1_page()]),
    )
    .unwrap();

    let pages = NativeTextLocator::default()
        .locate(&doc, &CancellationToken::new())
        .unwrap();
    assert_eq!(pages, vec![0, 2]);
}

#[test]
fn test_locate_stops_when_cancelled() {
    let doc = Document::from_bytes("c.pdf", &build_pdf(&[form1_page()])).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = NativeTextLocator::default().locate(&doc, &cancel);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_glyph_by_glyph_text_keeps_words_whole() {
    let page = PageSpec {
        per_glyph: true,
        ..form1_page()
    };
    let doc = Document::from_bytes("kerned.pdf", &build_pdf(&[page])).unwrap();

    let text = doc.page_text(0).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "FORM 1");
    assert_eq!(lines[1], "INDIVIDUAL ESTATE PROPERTY RECORD AND REPORT");
    assert_eq!(lines[2], "ASSET CASES");

    let pages = NativeTextLocator::default()
        .locate(&doc, &CancellationToken::new())
        .unwrap();
    assert_eq!(pages, vec![0]);
}

#[test]
fn test_span_width_uses_font_widths() {
    let doc = Document::from_bytes("w.pdf", &build_pdf(&[prose_page(&["MI"])])).unwrap();
    let content = doc.page_content(0).unwrap();
    // Helvetica M = 833, I = 278, at 8pt
    assert!((content.spans[0].width - 8.888).abs() < 0.01);
}

#[test]
fn test_text_inside_form_xobject() {
    let page = PageSpec {
        in_form: true,
        ..form1_page()
    };
    let doc = Document::from_bytes("form.pdf", &build_pdf(&[page])).unwrap();

    let text = doc.page_text(0).unwrap();
    assert_eq!(text.lines().next(), Some("FORM 1"));

    let pages = NativeTextLocator::default()
        .locate(&doc, &CancellationToken::new())
        .unwrap();
    assert_eq!(pages, vec![0]);
}

#[test]
fn test_form_matrix_places_text_like_page_content() {
    let direct = Document::from_bytes("a.pdf", &build_pdf(&[prose_page(&["First line"])])).unwrap();
    let wrapped = Document::from_bytes(
        "b.pdf",
        &build_pdf(&[PageSpec {
            in_form: true,
            ..prose_page(&["First line"])
        }]),
    )
    .unwrap();

    let expected = direct.text_blocks(0).unwrap();
    let actual = wrapped.text_blocks(0).unwrap();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].text, expected[0].text);
    assert!((actual[0].bbox.top - expected[0].bbox.top).abs() < 0.01);
    assert!((actual[0].bbox.left - expected[0].bbox.left).abs() < 0.01);
}

#[test]
fn test_empty_password_encryption_is_opened() {
    let bytes = encrypt_pdf(&build_pdf(&[form1_page()]), 1);
    let doc = Document::from_bytes("locked.pdf", &bytes).unwrap();

    assert_eq!(doc.page_count(), 1);
    assert!(doc.page_text(0).unwrap().starts_with("FORM 1"));
    let pages = NativeTextLocator::default()
        .locate(&doc, &CancellationToken::new())
        .unwrap();
    assert_eq!(pages, vec![0]);
}

#[test]
fn test_unsupported_encryption_is_rejected() {
    let bytes = encrypt_pdf(&build_pdf(&[form1_page()]), 4);
    let result = Document::from_bytes("locked.pdf", &bytes);
    assert!(matches!(result, Err(Error::Encrypted)));
}
