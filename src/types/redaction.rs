//! Core data types for the detection and application stages.

use serde::{Deserialize, Serialize};

use crate::types::geometry::Rect;

/// A contiguous run of literal text at a known page location, the atomic
/// unit of the positional index. `start`/`end` are byte offsets into the
/// concatenated extraction stream; spans are produced in stream order and
/// never overlap, and `end - start == text.len()` (the inter-span separator
/// is accounted for by the extractor, outside the span's own range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub page: usize,
    pub text: String,
    pub bbox: Rect,
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    /// Whether the given stream offset falls inside this span's `[start, end)`.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Which detector proposed a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Pattern,
    Semantic,
}

/// A detected span proposed for redaction, before deduplication and
/// application.
///
/// `page`/`bboxes` are unresolved for semantic-source candidates until the
/// suggested literal is re-located in the extraction stream; a candidate
/// that never resolves a page cannot be applied, but is still surfaced in
/// the audit trail as detected-but-not-applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRedaction {
    pub source: CandidateSource,
    /// Rule or category name ("ssn", "llm_identified", ...), carried into
    /// the audit record's `kind` field.
    pub rule: String,
    pub matched_text: String,
    pub start: usize,
    pub end: usize,
    pub page: Option<usize>,
    pub bboxes: Vec<Rect>,
    pub legal_code: String,
    pub citation: String,
    pub reason: String,
}

impl CandidateRedaction {
    /// Positional equality key used by the merger. Intentionally coarse:
    /// overlapping but non-identical ranges are distinct redactions.
    pub fn dedup_key(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// One entry of the audit trail: a single visual occurrence that was
/// redacted (`applied == true`), or a candidate whose geometry never
/// resolved and was therefore detected but not applied (`applied == false`,
/// `page`/`bbox` possibly absent). Immutable once returned; this is the
/// only artifact retained after the original un-redacted content is
/// discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedRedaction {
    /// Page-scoped sequential identifier, e.g. `redaction_2_17`.
    pub id: String,
    pub page: Option<usize>,
    pub text: String,
    pub bbox: Option<Rect>,
    /// Rule or category name that produced the redaction.
    #[serde(rename = "type")]
    pub kind: String,
    pub legal_code: String,
    pub citation: String,
    pub reason: String,
    pub applied: bool,
}
