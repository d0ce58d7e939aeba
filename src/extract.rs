//! Positional text extraction.
//!
//! Walks the document page by page and produces one concatenated text
//! stream plus the positional index that maps stream offsets back to page
//! and bounding box. Downstream exact-text search depends on byte
//! fidelity, so no normalization of any kind happens here.

use tracing::debug;

use crate::engine::DocumentHandle;
use crate::error::Result;
use crate::types::TextSpan;

/// Separator appended after every span, and again after every page, so a
/// match offset can never straddle an implicit page boundary ambiguously.
const SPAN_SEPARATOR: char = ' ';
const PAGE_SEPARATOR: char = '\n';

/// Extract the full text of a document together with its positional index.
///
/// Every atomic span contributes exactly one [`TextSpan`] whose offset
/// range covers the span's own text (`end - start == text.len()`);
/// concatenation order is page order, then in-page visual order as the
/// engine reports it.
pub fn extract_text_with_positions<H: DocumentHandle>(
    handle: &H,
) -> Result<(String, Vec<TextSpan>)> {
    let mut full_text = String::new();
    let mut spans = Vec::new();

    for page in 0..handle.page_count() {
        let page_text = handle.page_text(page)?;
        for raw in page_text.spans() {
            let start = full_text.len();
            full_text.push_str(&raw.text);
            spans.push(TextSpan {
                page,
                text: raw.text.clone(),
                bbox: raw.bbox,
                start,
                end: full_text.len(),
            });
            full_text.push(SPAN_SEPARATOR);
        }
        full_text.push(PAGE_SEPARATOR);
    }

    debug!(
        pages = handle.page_count(),
        spans = spans.len(),
        chars = full_text.len(),
        "extracted positional text"
    );
    Ok((full_text, spans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDocument;

    #[test]
    fn spans_carry_exact_offsets_into_the_stream() {
        let handle = FakeDocument::new(vec![
            vec!["Case No. 24-001", "SSN: 123-45-6789"],
            vec!["Jane Doe"],
        ]);
        let (full_text, spans) = extract_text_with_positions(&handle).unwrap();

        assert_eq!(spans.len(), 3);
        for span in &spans {
            assert_eq!(span.end - span.start, span.text.len());
            assert_eq!(&full_text[span.start..span.end], span.text);
        }
        assert_eq!(spans[0].page, 0);
        assert_eq!(spans[2].page, 1);
    }

    #[test]
    fn pages_are_separated_by_a_newline() {
        let handle = FakeDocument::new(vec![vec!["first"], vec!["second"]]);
        let (full_text, spans) = extract_text_with_positions(&handle).unwrap();

        assert_eq!(full_text, "first \nsecond \n");
        // The second page's span starts after the page separator.
        assert_eq!(spans[1].start, "first \n".len());
    }

    #[test]
    fn no_normalization_is_applied() {
        let handle = FakeDocument::new(vec![vec!["  MiXeD   Case\t"]]);
        let (full_text, _) = extract_text_with_positions(&handle).unwrap();
        assert!(full_text.starts_with("  MiXeD   Case\t"));
    }

    #[test]
    fn empty_document_yields_empty_index() {
        let handle = FakeDocument::new(vec![]);
        let (full_text, spans) = extract_text_with_positions(&handle).unwrap();
        assert!(full_text.is_empty());
        assert!(spans.is_empty());
    }
}
