//! Benchmarks for the hot paths that run once per page or token.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use form1x::extract::bin_tokens;
use form1x::model::{BoundingBox, TextBlock};
use form1x::{ColumnLayout, KeywordSet, Table};

/// Word tokens laid out like a dense 300 DPI Form 1 scan.
fn synthetic_tokens(rows: usize) -> Vec<TextBlock> {
    let xs = [40.0, 500.0, 900.0, 1300.0, 1580.0, 1900.0, 2300.0];
    let mut tokens = Vec::with_capacity(rows * xs.len());
    for row in 0..rows {
        let top = 400.0 + row as f32 * 45.0;
        for (col, x) in xs.iter().enumerate() {
            tokens.push(TextBlock::ocr(
                format!("r{}c{}", row, col),
                BoundingBox::new(*x, top, 80.0, 30.0),
                85.0,
                0,
            ));
        }
    }
    tokens
}

fn bench_binning(c: &mut Criterion) {
    let layout = ColumnLayout::form1();
    let mut group = c.benchmark_group("bin_tokens");

    for rows in [10, 50, 200] {
        let tokens = synthetic_tokens(rows);
        group.bench_function(format!("{}_rows", rows), |b| {
            b.iter(|| bin_tokens(black_box(&tokens), 2550.0, &layout, 15, 30.0));
        });
    }

    group.finish();
}

fn bench_keyword_count(c: &mut Criterion) {
    let keywords = KeywordSet::form1();
    let page = "FORM 1\nINDIVIDUAL ESTATE PROPERTY RECORD AND REPORT\nASSET CASES\n\
                Case No: 19-12345   Judge: Jane Doe   Trustee: John Roe\n"
        .repeat(20);

    c.bench_function("keyword_count_raw", |b| {
        b.iter(|| keywords.count_raw(black_box(&page)));
    });
}

fn bench_concat(c: &mut Criterion) {
    let tables: Vec<Table> = (0..10)
        .map(|_| bin_tokens(&synthetic_tokens(40), 2550.0, &ColumnLayout::form1(), 15, 30.0))
        .collect();

    c.bench_function("concat_10_pages", |b| {
        b.iter(|| Table::concat(black_box(&tables)));
    });
}

criterion_group!(benches, bench_binning, bench_keyword_count, bench_concat);
criterion_main!(benches);
