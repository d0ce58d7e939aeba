//! Document engine seam.
//!
//! The pipeline consumes the PDF engine as an opaque capability set: page
//! enumeration, structured text with geometry, exact-text search, staged
//! redaction, irreversible flatten, and save. Everything above this module
//! is engine-agnostic; the bundled [`lopdf_engine`] implementation is one
//! provider of these capabilities, and tests substitute an in-memory one.
//!
//! Redaction is deliberately two-phase at this seam: [`DocumentHandle::stage_redaction`]
//! is additive and reversible, and only [`DocumentHandle::apply_redactions`]
//! destroys content. Callers can inspect [`DocumentHandle::staged`] between
//! the phases.

pub mod lopdf_engine;

use std::path::Path;

use crate::error::Result;
use crate::types::Rect;

/// An atomic text run reported by the engine: literal text plus geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpan {
    pub text: String,
    pub bbox: Rect,
}

/// A visual line of spans.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<RawSpan>,
}

/// A block of lines (the engine's grouping granularity).
#[derive(Debug, Clone, Default)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// Structured text of one page: blocks -> lines -> spans, in visual order.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub blocks: Vec<TextBlock>,
}

impl PageText {
    /// All spans of the page in reading order.
    pub fn spans(&self) -> impl Iterator<Item = &RawSpan> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter())
    }
}

/// Opens documents.
pub trait DocumentEngine {
    type Handle: DocumentHandle;

    fn open(&self, path: &Path) -> Result<Self::Handle>;
}

/// An exclusively-owned, in-flight document.
///
/// A handle belongs to exactly one redaction operation for its whole
/// lifetime (open -> extract -> detect -> stage -> flatten -> save).
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    /// Structured text of a page with per-span geometry.
    fn page_text(&self, page: usize) -> Result<PageText>;

    /// Bounding rectangles of every visual occurrence of `needle` on the
    /// page. Matching is case-insensitive and exact otherwise.
    fn search(&self, page: usize, needle: &str) -> Result<Vec<Rect>>;

    /// Phase 1: stage a redaction rectangle on a page. Additive and
    /// reversible until [`Self::apply_redactions`] runs.
    fn stage_redaction(&mut self, page: usize, rect: Rect);

    /// Rectangles currently staged on a page and not yet flattened.
    fn staged(&self, page: usize) -> &[Rect];

    /// Phase 2: irreversibly flatten all staged redactions on a page,
    /// removing the underlying content inside every rectangle and burning
    /// in an opaque marker. Returns the number of rectangles applied.
    fn apply_redactions(&mut self, page: usize) -> Result<usize>;

    /// Write the (possibly mutated) document to `path`. Never the input path.
    fn save(&mut self, path: &Path) -> Result<()>;
}
