//! Redaction merger.

use std::collections::HashSet;

use tracing::debug;

use crate::types::CandidateRedaction;

/// Union the detectors' candidates, dropping duplicates by positional
/// `(start, end)` key. Order is first-seen across the concatenation, and
/// callers pass pattern candidates first, so when both detectors find the
/// identical range the pattern candidate (with its rule-bound citation)
/// wins and the later duplicate is dropped whole, metadata included.
/// Overlapping but non-identical ranges are distinct and all survive.
pub fn merge_candidates(candidates: Vec<CandidateRedaction>) -> Vec<CandidateRedaction> {
    let total = candidates.len();
    let mut seen = HashSet::new();
    let merged: Vec<CandidateRedaction> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key()))
        .collect();
    debug!(total, kept = merged.len(), "merged candidate redactions");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateSource;

    fn candidate(source: CandidateSource, rule: &str, start: usize, end: usize) -> CandidateRedaction {
        CandidateRedaction {
            source,
            rule: rule.to_string(),
            matched_text: "x".repeat(end - start),
            start,
            end,
            page: Some(0),
            bboxes: Vec::new(),
            legal_code: "CCPA".into(),
            citation: "citation".into(),
            reason: "reason".into(),
        }
    }

    #[test]
    fn identical_ranges_keep_the_pattern_candidate() {
        let merged = merge_candidates(vec![
            candidate(CandidateSource::Pattern, "ssn", 10, 21),
            candidate(CandidateSource::Semantic, "llm_identified", 10, 21),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, CandidateSource::Pattern);
        assert_eq!(merged[0].rule, "ssn");
    }

    #[test]
    fn overlapping_but_distinct_ranges_both_survive() {
        let merged = merge_candidates(vec![
            candidate(CandidateSource::Pattern, "credit_card", 0, 17),
            candidate(CandidateSource::Pattern, "bank_account", 5, 17),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn first_seen_order_is_stable() {
        let merged = merge_candidates(vec![
            candidate(CandidateSource::Pattern, "a", 0, 5),
            candidate(CandidateSource::Pattern, "b", 10, 15),
            candidate(CandidateSource::Semantic, "c", 0, 5),
            candidate(CandidateSource::Semantic, "d", 20, 25),
        ]);
        let rules: Vec<_> = merged.iter().map(|c| c.rule.as_str()).collect();
        assert_eq!(rules, vec!["a", "b", "d"]);
    }
}
