//! Layout analysis for PDF pages.
//!
//! Walks a page content stream and produces positioned text spans and ruling
//! lines in PDF user space (origin bottom-left, y grows upwards). Those are
//! the inputs of the native table strategies, the keyword scan and the page
//! classifier.

use crate::error::Result;

use super::backend::{
    get_number_from_value, ContentOp, PageId, PdfBackend, PdfValue, ResourceScope,
};
use super::fonts::FontMetrics;

/// TJ adjustments (thousandths of an em) above this insert a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// TJ adjustments above this start a new span (the gap is a column gap).
const TJ_SPLIT_THRESHOLD: f32 = 1000.0;

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Form XObjects nested deeper than this are not drawn.
const MAX_FORM_DEPTH: usize = 8;

/// A text span with position information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Width of the text (sum of glyph advances)
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new text span.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// A text line composed of spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline of the first span)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Largest font size in the line
    pub font_size: f32,
}

impl TextLine {
    /// Create a line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.total_cmp(&b.x));
        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        let x = spans.first().map(|s| s.x).unwrap_or(0.0);
        let font_size = spans.iter().map(|s| s.font_size).fold(0.0, f32::max);
        Self {
            spans,
            y,
            x,
            font_size,
        }
    }

    /// Rightmost edge.
    pub fn right(&self) -> f32 {
        self.spans.iter().map(TextSpan::right).fold(self.x, f32::max)
    }

    /// Highest point of the line.
    pub fn top(&self) -> f32 {
        self.spans.iter().map(TextSpan::top).fold(f32::MIN, f32::max)
    }

    /// Lowest point of the line.
    pub fn bottom(&self) -> f32 {
        self.spans.iter().map(TextSpan::bottom).fold(f32::MAX, f32::min)
    }

    /// Combined text, with a space wherever two spans do not touch.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - prev.right();
                let threshold = span.font_size * AVG_GLYPH_WIDTH * 0.2;
                if gap > threshold && !prev.text.ends_with(' ') && !span.text.starts_with(' ') {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }
        result
    }
}

/// A horizontal or vertical ruling line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rule {
    /// Build a rule with ordered endpoints.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn is_horizontal(&self, tol: f32) -> bool {
        (self.y1 - self.y0) <= tol && (self.x1 - self.x0) > tol
    }

    pub fn is_vertical(&self, tol: f32) -> bool {
        (self.x1 - self.x0) <= tol && (self.y1 - self.y0) > tol
    }
}

/// Everything the native strategies read from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub spans: Vec<TextSpan>,
    pub rules: Vec<Rule>,
}

/// Affine transform in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6]
            .iter()
            .map(|v| get_number_from_value(v).unwrap_or(0.0))
            .collect();
        Some(Matrix {
            a: n[0],
            b: n[1],
            c: n[2],
            d: n[3],
            e: n[4],
            f: n[5],
        })
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn scale_x(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn scale_y(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state. The matrices reset on BT; the rest persists across text
/// objects.
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    font_name: Vec<u8>,
    font_size: f32,
    metrics: FontMetrics,
    char_spacing: f32,
    word_spacing: f32,
    /// Tz / 100
    h_scale: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            font_name: Vec::new(),
            font_size: 12.0,
            metrics: FontMetrics::default(),
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn advance(&mut self, text_space_width: f32) {
        self.matrix = Matrix::translation(text_space_width, 0.0).then(&self.matrix);
    }

    /// Horizontal displacement of a shown string in text space.
    fn string_advance(&self, bytes: &[u8]) -> f32 {
        let word_spacing = self.metrics.is_single_byte();
        let total: f32 = self
            .metrics
            .codes(bytes)
            .map(|code| {
                let mut w = self.metrics.width(code) / 1000.0 * self.font_size + self.char_spacing;
                if word_spacing && code == 32 {
                    w += self.word_spacing;
                }
                w
            })
            .sum();
        total * self.h_scale
    }
}

/// Layout analyzer for extracting positioned content from PDF pages.
pub struct LayoutAnalyzer<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: PdfBackend + ?Sized> LayoutAnalyzer<'a, B> {
    /// Create a new layout analyzer.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Extract text spans and ruling lines from a page.
    pub fn extract_page(&self, page: PageId) -> Result<PageContent> {
        let data = self.backend.page_content(page)?;
        if data.is_empty() {
            return Ok(PageContent::default());
        }
        let ops = self.backend.decode_content(&data)?;
        let mut out = PageContent::default();
        self.interpret(ResourceScope::Page(page), &ops, Matrix::IDENTITY, 0, &mut out);
        Ok(out)
    }

    /// Run one content stream. Form XObjects recurse with their `/Matrix`
    /// applied on top of the invoking CTM.
    fn interpret(
        &self,
        scope: ResourceScope,
        ops: &[ContentOp],
        base_ctm: Matrix,
        depth: usize,
        out: &mut PageContent,
    ) {
        let mut ctm = base_ctm;
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();
        let mut in_text_block = false;

        let mut path: Vec<Rule> = Vec::new();
        let mut current_point: Option<(f32, f32)> = None;
        let mut subpath_start: Option<(f32, f32)> = None;

        for op in ops {
            let num = |i: usize| op.operands.get(i).and_then(get_number_from_value);
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => ctm = ctm_stack.pop().unwrap_or(base_ctm),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text.matrix = Matrix::IDENTITY;
                    text.line_matrix = Matrix::IDENTITY;
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        text.metrics = self.backend.font_metrics(scope, name);
                        text.font_name = name.clone();
                    }
                    text.font_size = num(1).unwrap_or(12.0);
                }
                "TL" => text.leading = num(0).unwrap_or(0.0),
                "Tc" => text.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => text.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => text.h_scale = num(0).unwrap_or(100.0) / 100.0,
                "Td" => text.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
                "TD" => {
                    let ty = num(1).unwrap_or(0.0);
                    text.leading = -ty;
                    text.move_line(num(0).unwrap_or(0.0), ty);
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        text.matrix = m;
                        text.line_matrix = m;
                    }
                }
                "T*" => text.move_line(0.0, -text.leading),
                "Tj" if in_text_block => {
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        self.show_text(&mut out.spans, &mut text, &ctm, scope, bytes);
                    }
                }
                "'" | "\"" if in_text_block => {
                    if op.operator == "\"" {
                        text.word_spacing = num(0).unwrap_or(text.word_spacing);
                        text.char_spacing = num(1).unwrap_or(text.char_spacing);
                    }
                    text.move_line(0.0, -text.leading);
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(idx) {
                        self.show_text(&mut out.spans, &mut text, &ctm, scope, bytes);
                    }
                }
                "TJ" if in_text_block => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        self.show_array(&mut out.spans, &mut text, &ctm, scope, items);
                    }
                }
                "Do" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        self.draw_form(scope, name, &ctm, depth, out);
                    }
                }
                "m" => {
                    let p = (num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
                    current_point = Some(p);
                    subpath_start = Some(p);
                }
                "l" => {
                    let p = (num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
                    if let Some((x0, y0)) = current_point {
                        path.push(Rule::new(x0, y0, p.0, p.1));
                    }
                    current_point = Some(p);
                }
                "h" => {
                    if let (Some((x0, y0)), Some((x1, y1))) = (current_point, subpath_start) {
                        path.push(Rule::new(x0, y0, x1, y1));
                    }
                    current_point = subpath_start;
                }
                "re" => {
                    let (x, y) = (num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
                    let (w, h) = (num(2).unwrap_or(0.0), num(3).unwrap_or(0.0));
                    push_rectangle(&mut path, x, y, w, h);
                    current_point = Some((x, y));
                    subpath_start = Some((x, y));
                }
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    out.rules.extend(path.drain(..).map(|r| transform_rule(&r, &ctm)));
                    current_point = None;
                    subpath_start = None;
                }
                "n" => {
                    path.clear();
                    current_point = None;
                    subpath_start = None;
                }
                _ => {}
            }
        }
    }

    fn draw_form(
        &self,
        scope: ResourceScope,
        name: &[u8],
        ctm: &Matrix,
        depth: usize,
        out: &mut PageContent,
    ) {
        let Some(form) = self.backend.form_xobject(scope, name) else {
            return;
        };
        if depth >= MAX_FORM_DEPTH {
            log::debug!(
                "Form XObject {} nested too deep, skipping",
                String::from_utf8_lossy(name)
            );
            return;
        }
        let ops = match self.backend.decode_content(&form.content) {
            Ok(ops) => ops,
            Err(e) => {
                log::debug!(
                    "Could not decode Form XObject {}: {}",
                    String::from_utf8_lossy(name),
                    e
                );
                return;
            }
        };
        let [a, b, c, d, e, f] = form.matrix;
        let form_ctm = Matrix { a, b, c, d, e, f }.then(ctm);
        self.interpret(form.scope, &ops, form_ctm, depth + 1, out);
    }

    /// Emit one span for a shown string and advance the text matrix.
    fn show_text(
        &self,
        spans: &mut Vec<TextSpan>,
        text: &mut TextState,
        ctm: &Matrix,
        scope: ResourceScope,
        bytes: &[u8],
    ) {
        let start = text.matrix;
        let advance = text.string_advance(bytes);
        text.advance(advance);
        let decoded = self.backend.decode_text(scope, &text.font_name, bytes);
        emit_span(spans, &start, advance, text.font_size, ctm, decoded);
    }

    /// TJ: strings interleaved with positioning adjustments (1/1000 em).
    /// Moderate gaps become word spaces, wide gaps split the span.
    fn show_array(
        &self,
        spans: &mut Vec<TextSpan>,
        text: &mut TextState,
        ctm: &Matrix,
        scope: ResourceScope,
        items: &[PdfValue],
    ) {
        let mut combined = String::new();
        let mut start = text.matrix;
        let mut extent = 0.0;
        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let chunk = self.backend.decode_text(scope, &text.font_name, bytes);
                    if combined.is_empty() {
                        start = text.matrix;
                        extent = 0.0;
                    }
                    let advance = text.string_advance(bytes);
                    text.advance(advance);
                    extent += advance;
                    combined.push_str(&chunk);
                }
                other => {
                    let Some(n) = get_number_from_value(other) else {
                        continue;
                    };
                    let adjustment = -n;
                    let shift = adjustment / 1000.0 * text.font_size * text.h_scale;
                    if adjustment > TJ_SPLIT_THRESHOLD {
                        let chunk = std::mem::take(&mut combined);
                        emit_span(spans, &start, extent, text.font_size, ctm, chunk);
                    } else {
                        if adjustment > TJ_SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                        {
                            combined.push(' ');
                        }
                        extent += shift;
                    }
                    text.advance(shift);
                }
            }
        }
        emit_span(spans, &start, extent, text.font_size, ctm, combined);
    }
}

/// Push a span starting at text matrix `start` and `advance` text space
/// units wide; blank text is dropped.
fn emit_span(
    spans: &mut Vec<TextSpan>,
    start: &Matrix,
    advance: f32,
    font_size: f32,
    ctm: &Matrix,
    s: String,
) {
    if s.trim().is_empty() {
        return;
    }
    let render = start.then(ctm);
    let (x, y) = render.apply(0.0, 0.0);
    let width = advance * render.scale_x();
    let size = font_size * render.scale_y();
    spans.push(TextSpan::new(s, x, y, width, size));
}

fn push_rectangle(path: &mut Vec<Rule>, x: f32, y: f32, w: f32, h: f32) {
    let (x1, y1) = (x + w, y + h);
    path.push(Rule::new(x, y, x1, y));
    path.push(Rule::new(x1, y, x1, y1));
    path.push(Rule::new(x1, y1, x, y1));
    path.push(Rule::new(x, y1, x, y));
}

fn transform_rule(rule: &Rule, ctm: &Matrix) -> Rule {
    let (x0, y0) = ctm.apply(rule.x0, rule.y0);
    let (x1, y1) = ctm.apply(rule.x1, rule.y1);
    Rule::new(x0, y0, x1, y1)
}

/// Group spans into lines, top of the page first.
///
/// Spans whose baselines are within `row_tol` points of the first span of the
/// current line join that line.
pub fn group_spans_into_lines(spans: &[TextSpan], row_tol: f32) -> Vec<TextLine> {
    let mut sorted = spans.to_vec();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in sorted {
        match current_y {
            Some(y) if (span.y - y).abs() <= row_tol => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }
    lines
}

/// Group lines into blocks: a block continues while the next line starts
/// within 1.5 line heights below and overlaps it horizontally.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<Vec<TextLine>> {
    let mut blocks: Vec<Vec<TextLine>> = Vec::new();
    for line in lines {
        let joins = blocks.last().and_then(|b| b.last()).is_some_and(|prev| {
            let gap = prev.bottom() - line.top();
            let overlaps = line.x <= prev.right() && prev.x <= line.right();
            overlaps && gap <= prev.font_size.max(line.font_size) * 1.5
        });
        match blocks.last_mut() {
            Some(block) if joins => block.push(line),
            _ => blocks.push(vec![line]),
        }
    }
    blocks
}
