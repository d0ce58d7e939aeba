// Candidate detection: deterministic pattern rules and the semantic
// classifier, each producing CandidateRedactions over the same
// positional index.

pub mod openai;
pub mod pattern;
pub mod semantic;

use crate::types::{Rect, TextSpan};

/// Resolve a stream offset to page and bounding boxes.
///
/// The page is fixed by the first span whose `[start, end)` contains the
/// offset; the boxes are those of every span on that page containing the
/// same offset. Resolution keys off the match's *start* offset only, so a
/// match straddling adjacent spans (or pages) is anchored at its start
/// rather than covered in full.
pub fn resolve_geometry(spans: &[TextSpan], offset: usize) -> (Option<usize>, Vec<Rect>) {
    let page = spans
        .iter()
        .find(|s| s.contains_offset(offset))
        .map(|s| s.page);
    let Some(page) = page else {
        return (None, Vec::new());
    };
    let bboxes = spans
        .iter()
        .filter(|s| s.page == page && s.contains_offset(offset))
        .map(|s| s.bbox)
        .collect();
    (Some(page), bboxes)
}
