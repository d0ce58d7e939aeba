//! `lopdf`-backed document engine.
//!
//! Text geometry comes from a simplified content-stream walk: the text
//! matrix is modeled as translation only (Td/TD/Tm/T*), and glyph widths
//! use a 0.5 em average, so bounding boxes are approximations suitable for
//! locating and covering text, not for typographic measurement. Flatten
//! blanks every show-text operator whose box intersects a staged rectangle
//! (preserving its layout side effects) and burns an opaque fill on top,
//! so the underlying literal is no longer extractable from the stream.

use std::collections::HashSet;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat};
use tracing::debug;

use crate::engine::{DocumentEngine, DocumentHandle, PageText, RawSpan, TextBlock, TextLine};
use crate::error::{Error, Result};
use crate::types::Rect;

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;

pub struct LopdfEngine;

impl DocumentEngine for LopdfEngine {
    type Handle = LopdfDocument;

    fn open(&self, path: &Path) -> Result<LopdfDocument> {
        let doc = Document::load(path)
            .map_err(|e| Error::DocumentParse(format!("{}: {e}", path.display())))?;
        Ok(LopdfDocument::from_document(doc))
    }
}

pub struct LopdfDocument {
    doc: Document,
    /// Page object ids in page-number order.
    pages: Vec<ObjectId>,
    staged: Vec<Vec<Rect>>,
}

impl LopdfDocument {
    /// Wrap an already-parsed document. Used by the engine's `open` and by
    /// callers that build documents in memory.
    pub fn from_document(doc: Document) -> Self {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let staged = vec![Vec::new(); pages.len()];
        Self { doc, pages, staged }
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.pages
            .get(page)
            .copied()
            .ok_or_else(|| Error::DocumentParse(format!("page {page} out of range")))
    }

    fn decoded_content(&self, page_id: ObjectId) -> Result<Content> {
        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| Error::DocumentParse(format!("page content: {e}")))?;
        Content::decode(&data).map_err(|e| Error::DocumentParse(format!("content stream: {e}")))
    }
}

/// One show-text operator with its computed geometry.
struct Positioned {
    op_index: usize,
    line: usize,
    text: String,
    bbox: Rect,
}

fn operand_f64(obj: Option<&Object>) -> Option<f64> {
    match obj? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn operand_text(obj: Option<&Object>) -> Option<String> {
    match obj? {
        // Treat string bytes as Latin-1; exact byte fidelity matters more
        // than typographic correctness here.
        Object::String(bytes, _) => Some(bytes.iter().map(|&b| b as char).collect()),
        _ => None,
    }
}

/// Walk a decoded content stream and compute a box for every shown string.
fn walk(content: &Content) -> Vec<Positioned> {
    let mut out = Vec::new();
    let mut font_size = 12.0_f64;
    let mut leading = 0.0_f64;
    let (mut line_x, mut line_y) = (0.0_f64, 0.0_f64);
    let (mut cur_x, mut cur_y) = (0.0_f64, 0.0_f64);
    let mut line_no = 0_usize;

    let mut emit = |i: usize,
                    line: usize,
                    text: String,
                    cur_x: &mut f64,
                    cur_y: f64,
                    font_size: f64,
                    out: &mut Vec<Positioned>| {
        if text.is_empty() {
            return;
        }
        let width = text.chars().count() as f64 * font_size * AVG_GLYPH_WIDTH;
        let bbox = Rect::new(*cur_x, cur_y, *cur_x + width, cur_y + font_size);
        out.push(Positioned {
            op_index: i,
            line,
            text,
            bbox,
        });
        *cur_x += width;
    };

    for (i, op) in content.operations.iter().enumerate() {
        match op.operator.as_str() {
            "BT" => {
                line_x = 0.0;
                line_y = 0.0;
                cur_x = 0.0;
                cur_y = 0.0;
                line_no += 1;
            }
            "Tf" => {
                if let Some(size) = operand_f64(op.operands.get(1)) {
                    font_size = size;
                }
            }
            "TL" => {
                if let Some(l) = operand_f64(op.operands.first()) {
                    leading = l;
                }
            }
            "Td" | "TD" => {
                let tx = operand_f64(op.operands.first()).unwrap_or(0.0);
                let ty = operand_f64(op.operands.get(1)).unwrap_or(0.0);
                if op.operator == "TD" {
                    leading = -ty;
                }
                line_x += tx;
                line_y += ty;
                cur_x = line_x;
                cur_y = line_y;
                line_no += 1;
            }
            "Tm" => {
                line_x = operand_f64(op.operands.get(4)).unwrap_or(0.0);
                line_y = operand_f64(op.operands.get(5)).unwrap_or(0.0);
                cur_x = line_x;
                cur_y = line_y;
                line_no += 1;
            }
            "T*" => {
                line_y -= leading;
                cur_x = line_x;
                cur_y = line_y;
                line_no += 1;
            }
            "Tj" => {
                if let Some(text) = operand_text(op.operands.first()) {
                    emit(i, line_no, text, &mut cur_x, cur_y, font_size, &mut out);
                }
            }
            "'" | "\"" => {
                line_y -= leading;
                cur_x = line_x;
                cur_y = line_y;
                line_no += 1;
                let operand = if op.operator == "'" {
                    op.operands.first()
                } else {
                    op.operands.get(2)
                };
                if let Some(text) = operand_text(operand) {
                    emit(i, line_no, text, &mut cur_x, cur_y, font_size, &mut out);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let text: String = items
                        .iter()
                        .filter_map(|item| operand_text(Some(item)))
                        .collect();
                    emit(i, line_no, text, &mut cur_x, cur_y, font_size, &mut out);
                }
            }
            _ => {}
        }
    }

    out
}

/// Replace every string operand of a show-text operator with same-length
/// blanks, keeping its layout side effects intact.
fn blank_operation(op: &mut Operation) {
    for operand in op.operands.iter_mut() {
        blank_object(operand);
    }
}

fn blank_object(obj: &mut Object) {
    match obj {
        Object::String(bytes, _) => {
            *obj = Object::String(vec![b' '; bytes.len()], StringFormat::Literal);
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                blank_object(item);
            }
        }
        _ => {}
    }
}

fn int(v: f64) -> Object {
    Object::Integer(v.round() as i64)
}

impl DocumentHandle for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<PageText> {
        let content = self.decoded_content(self.page_id(page)?)?;
        let positioned = walk(&content);

        let mut block = TextBlock::default();
        let mut current_line: Option<usize> = None;
        for pos in positioned {
            if current_line != Some(pos.line) {
                block.lines.push(TextLine::default());
                current_line = Some(pos.line);
            }
            if let Some(line) = block.lines.last_mut() {
                line.spans.push(RawSpan {
                    text: pos.text,
                    bbox: pos.bbox,
                });
            }
        }

        Ok(PageText {
            blocks: vec![block],
        })
    }

    fn search(&self, page: usize, needle: &str) -> Result<Vec<Rect>> {
        let text = self.page_text(page)?;
        let mut hits = Vec::new();
        for span in text.spans() {
            search_in_span(&span.text, span.bbox, needle, &mut hits);
        }
        Ok(hits)
    }

    fn stage_redaction(&mut self, page: usize, rect: Rect) {
        if let Some(staged) = self.staged.get_mut(page) {
            staged.push(rect);
        }
    }

    fn staged(&self, page: usize) -> &[Rect] {
        self.staged.get(page).map(Vec::as_slice).unwrap_or(&[])
    }

    fn apply_redactions(&mut self, page: usize) -> Result<usize> {
        let rects = std::mem::take(
            self.staged
                .get_mut(page)
                .ok_or_else(|| Error::DocumentParse(format!("page {page} out of range")))?,
        );
        if rects.is_empty() {
            return Ok(0);
        }

        let page_id = self.page_id(page)?;
        let content = self.decoded_content(page_id)?;

        let doomed: HashSet<usize> = walk(&content)
            .into_iter()
            .filter(|pos| rects.iter().any(|r| r.intersects(&pos.bbox)))
            .map(|pos| pos.op_index)
            .collect();
        debug!(page, rects = rects.len(), operators = doomed.len(), "flattening redactions");

        let mut operations = content.operations;
        for (i, op) in operations.iter_mut().enumerate() {
            if doomed.contains(&i) {
                blank_operation(op);
            }
        }

        // Burn in the opaque markers.
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "rg",
            vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        ));
        for r in &rects {
            operations.push(Operation::new(
                "re",
                vec![int(r.x0), int(r.y0), int(r.width()), int(r.height())],
            ));
            operations.push(Operation::new("f", vec![]));
        }
        operations.push(Operation::new("Q", vec![]));

        let encoded = Content { operations }
            .encode()
            .map_err(|e| Error::Save(format!("content encode: {e}")))?;
        self.doc
            .change_page_content(page_id, encoded)
            .map_err(|e| Error::Save(format!("page rewrite: {e}")))?;

        Ok(rects.len())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.doc
            .save(path)
            .map_err(|e| Error::Save(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

/// Case-insensitive exact search of `needle` within a single span,
/// emitting a proportional sub-rectangle per occurrence. Literals that
/// cross span boundaries are not found here; the applicator surfaces those
/// as detected-but-not-applied.
pub(crate) fn search_in_span(span_text: &str, bbox: Rect, needle: &str, out: &mut Vec<Rect>) {
    let hay: Vec<char> = span_text.chars().collect();
    let ned: Vec<char> = needle.chars().collect();
    if ned.is_empty() || hay.len() < ned.len() {
        return;
    }
    let total = hay.len() as f64;
    let mut i = 0;
    while i + ned.len() <= hay.len() {
        let matched = hay[i..i + ned.len()]
            .iter()
            .zip(ned.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b));
        if matched {
            let x0 = bbox.x0 + bbox.width() * (i as f64 / total);
            let x1 = bbox.x0 + bbox.width() * ((i + ned.len()) as f64 / total);
            out.push(Rect::new(x0, bbox.y0, x1, bbox.y1));
            i += ned.len();
        } else {
            i += 1;
        }
    }
}
