//! Redaction applicator.
//!
//! Turns surviving candidates into destructive page edits plus the audit
//! trail. Application is two-phase per page: every occurrence is first
//! staged (additive, reversible), then the page is flattened exactly once
//! (irreversible). Candidates whose geometry never resolved are kept in
//! the trail as detected-but-not-applied instead of vanishing from the
//! compliance record.

use std::path::Path;

use tracing::{info, warn};

use crate::engine::DocumentHandle;
use crate::error::Result;
use crate::types::{AppliedRedaction, CandidateRedaction};

pub struct RedactionApplicator;

impl RedactionApplicator {
    pub fn new() -> Self {
        Self
    }

    /// Apply the merged candidate set and save the mutated document to
    /// `output`. Returns one record per visual occurrence redacted, plus
    /// one `applied=false` record per candidate that could not be placed.
    pub fn apply_candidates<H: DocumentHandle>(
        &self,
        handle: &mut H,
        candidates: &[CandidateRedaction],
        output: &Path,
    ) -> Result<Vec<AppliedRedaction>> {
        let mut records: Vec<AppliedRedaction> = Vec::new();

        for page in 0..handle.page_count() {
            for candidate in candidates.iter().filter(|c| c.page == Some(page)) {
                let occurrences = handle.search(page, &candidate.matched_text)?;
                if occurrences.is_empty() {
                    // The stream said the text is here but the live page
                    // search cannot place it (e.g. it crosses text runs).
                    warn!(
                        page,
                        rule = %candidate.rule,
                        "candidate not found on its page; recording as not applied"
                    );
                    records.push(unapplied_record(candidate, records.len()));
                    continue;
                }
                for bbox in occurrences {
                    handle.stage_redaction(page, bbox);
                    records.push(AppliedRedaction {
                        id: format!("redaction_{page}_{}", records.len()),
                        page: Some(page),
                        text: candidate.matched_text.clone(),
                        bbox: Some(bbox),
                        kind: candidate.rule.clone(),
                        legal_code: candidate.legal_code.clone(),
                        citation: candidate.citation.clone(),
                        reason: candidate.reason.clone(),
                        applied: true,
                    });
                }
            }
            // Single irreversible step for the whole page.
            handle.apply_redactions(page)?;
        }

        // Candidates that never resolved a page cannot be applied at all;
        // they still belong in the audit trail.
        for candidate in candidates.iter().filter(|c| c.page.is_none()) {
            records.push(unapplied_record(candidate, records.len()));
        }

        handle.save(output)?;
        info!(
            records = records.len(),
            applied = records.iter().filter(|r| r.applied).count(),
            output = %output.display(),
            "redactions applied"
        );
        Ok(records)
    }

    /// Secondary, caller-trusted mode: stage exactly the given records'
    /// rectangles without any text verification, flatten, and save.
    /// Records with `applied == false` or without geometry are skipped.
    pub fn apply_records<H: DocumentHandle>(
        &self,
        handle: &mut H,
        records: &[AppliedRedaction],
        output: &Path,
    ) -> Result<usize> {
        let mut staged = 0_usize;
        for record in records {
            if !record.applied {
                continue;
            }
            let (Some(page), Some(bbox)) = (record.page, record.bbox) else {
                continue;
            };
            if page >= handle.page_count() {
                warn!(page, id = %record.id, "record targets a page the document does not have");
                continue;
            }
            handle.stage_redaction(page, bbox);
            staged += 1;
        }

        for page in 0..handle.page_count() {
            handle.apply_redactions(page)?;
        }
        handle.save(output)?;
        info!(staged, output = %output.display(), "trusted redaction set applied");
        Ok(staged)
    }
}

impl Default for RedactionApplicator {
    fn default() -> Self {
        Self::new()
    }
}

fn unapplied_record(candidate: &CandidateRedaction, index: usize) -> AppliedRedaction {
    let page_part = candidate
        .page
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unplaced".to_string());
    AppliedRedaction {
        id: format!("redaction_{page_part}_{index}"),
        page: candidate.page,
        text: candidate.matched_text.clone(),
        bbox: candidate.bboxes.first().copied(),
        kind: candidate.rule.clone(),
        legal_code: candidate.legal_code.clone(),
        citation: candidate.citation.clone(),
        reason: candidate.reason.clone(),
        applied: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDocument;
    use crate::types::{CandidateSource, Rect};
    use std::path::PathBuf;

    fn candidate(rule: &str, text: &str, page: Option<usize>) -> CandidateRedaction {
        CandidateRedaction {
            source: CandidateSource::Pattern,
            rule: rule.to_string(),
            matched_text: text.to_string(),
            start: 0,
            end: text.len(),
            page,
            bboxes: Vec::new(),
            legal_code: "CCP_1798.3".into(),
            citation: "California Civil Code § 1798.3".into(),
            reason: "test".into(),
        }
    }

    #[test]
    fn one_record_per_visual_occurrence() {
        let mut doc = FakeDocument::new(vec![vec!["Jane Doe", "saw", "Jane Doe"]]);
        let records = RedactionApplicator::new()
            .apply_candidates(
                &mut doc,
                &[candidate("llm_identified", "Jane Doe", Some(0))],
                &PathBuf::from("out.pdf"),
            )
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.applied));
        assert_eq!(records[0].id, "redaction_0_0");
        assert_eq!(records[1].id, "redaction_0_1");
        assert!(!doc.page_string(0).contains("Jane Doe"));
        assert!(doc.page_string(0).contains("saw"));
        assert_eq!(doc.saved_to, vec![PathBuf::from("out.pdf")]);
    }

    #[test]
    fn pages_flatten_once_after_staging() {
        let mut doc = FakeDocument::new(vec![
            vec!["SSN 123-45-6789", "phone 555-123-4567"],
            vec!["clean page"],
        ]);
        let candidates = vec![
            candidate("ssn", "123-45-6789", Some(0)),
            candidate("phone", "555-123-4567", Some(0)),
        ];
        RedactionApplicator::new()
            .apply_candidates(&mut doc, &candidates, &PathBuf::from("out.pdf"))
            .unwrap();

        // One flatten for page 0; page 1 had nothing staged.
        assert_eq!(doc.flattened_pages, vec![0]);
        assert!(doc.staged(0).is_empty());
    }

    #[test]
    fn unresolved_candidates_stay_in_the_audit_trail() {
        let mut doc = FakeDocument::new(vec![vec!["nothing sensitive here"]]);
        let candidates = vec![
            // Resolved to a page, but the literal is not on it.
            candidate("ssn", "123-45-6789", Some(0)),
            // Never resolved to a page at all.
            candidate("llm_identified", "John Roe", None),
        ];
        let records = RedactionApplicator::new()
            .apply_candidates(&mut doc, &candidates, &PathBuf::from("out.pdf"))
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.applied));
        assert_eq!(records[0].page, Some(0));
        assert_eq!(records[1].page, None);
        assert_eq!(records[1].id, "redaction_unplaced_1");
        assert_eq!(doc.page_string(0), "nothing sensitive here");
    }

    #[test]
    fn trusted_mode_applies_given_geometry_and_skips_unapplied() {
        let mut doc = FakeDocument::new(vec![vec!["alpha", "bravo"]]);
        let span_box = doc.search(0, "alpha").unwrap()[0];
        let records = vec![
            AppliedRedaction {
                id: "redaction_0_0".into(),
                page: Some(0),
                text: "alpha".into(),
                bbox: Some(span_box),
                kind: "ssn".into(),
                legal_code: "CCP_1798.3".into(),
                citation: "cite".into(),
                reason: "r".into(),
                applied: true,
            },
            AppliedRedaction {
                id: "redaction_0_1".into(),
                page: Some(0),
                text: "bravo".into(),
                bbox: Some(Rect::new(0.0, 0.0, 1.0, 1.0)),
                kind: "ssn".into(),
                legal_code: "CCP_1798.3".into(),
                citation: "cite".into(),
                reason: "r".into(),
                applied: false,
            },
        ];

        let staged = RedactionApplicator::new()
            .apply_records(&mut doc, &records, &PathBuf::from("out.pdf"))
            .unwrap();

        assert_eq!(staged, 1);
        assert!(!doc.page_string(0).contains("alpha"));
        assert!(doc.page_string(0).contains("bravo"));
    }

    #[test]
    fn reapplying_the_same_records_is_idempotent() {
        let mut doc = FakeDocument::new(vec![vec!["secret", "public"]]);
        let bbox = doc.search(0, "secret").unwrap()[0];
        let records = vec![AppliedRedaction {
            id: "redaction_0_0".into(),
            page: Some(0),
            text: "secret".into(),
            bbox: Some(bbox),
            kind: "ssn".into(),
            legal_code: "CCP_1798.3".into(),
            citation: "cite".into(),
            reason: "r".into(),
            applied: true,
        }];

        let applicator = RedactionApplicator::new();
        applicator
            .apply_records(&mut doc, &records, &PathBuf::from("out1.pdf"))
            .unwrap();
        let after_first = doc.page_string(0);
        applicator
            .apply_records(&mut doc, &records, &PathBuf::from("out2.pdf"))
            .unwrap();

        assert_eq!(doc.page_string(0), after_first);
        assert!(doc.page_string(0).contains("public"));
    }

    #[test]
    fn save_failure_is_fatal() {
        let mut doc = FakeDocument::new(vec![vec!["text"]]);
        doc.fail_on_save = true;
        let err = RedactionApplicator::new()
            .apply_candidates(&mut doc, &[], &PathBuf::from("out.pdf"))
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
