//! Deterministic pattern detector.
//!
//! Applies the category table's regex rules to the extracted stream and
//! resolves each match back to page geometry through the positional index.
//! Detection is best-effort per rule: a rule whose pattern does not
//! compile is skipped with a warning and the remaining rules still run.

use regex::RegexBuilder;
use tracing::{debug, warn};

use crate::config::CategoryTable;
use crate::detect::resolve_geometry;
use crate::error::Error;
use crate::types::{CandidateRedaction, CandidateSource, TextSpan};

struct CompiledRule {
    name: String,
    regex: regex::Regex,
    legal_code: String,
    citation: String,
    reason: String,
}

pub struct PatternDetector {
    rules: Vec<CompiledRule>,
}

impl PatternDetector {
    /// Compile the table's pattern rules, in table order. Broken patterns
    /// are dropped here, one by one, never aborting the detector.
    pub fn from_table(table: &CategoryTable) -> Self {
        let mut rules = Vec::new();
        for category in table.pattern_categories() {
            let pattern = category.pattern.as_deref().unwrap_or_default();
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => rules.push(CompiledRule {
                    name: category.name.clone(),
                    regex,
                    legal_code: category.legal_code.clone(),
                    citation: table.citation_for(&category.legal_code),
                    reason: category.reason.clone(),
                }),
                Err(e) => {
                    let err = Error::Rule {
                        rule: category.name.clone(),
                        message: e.to_string(),
                    };
                    warn!(rule = %category.name, %err, "skipping rule with invalid pattern");
                }
            }
        }
        Self { rules }
    }

    /// Scan the full text with every rule. Candidates are ordered by rule
    /// declaration order, then text order within a rule.
    pub fn detect(&self, full_text: &str, spans: &[TextSpan]) -> Vec<CandidateRedaction> {
        let mut candidates = Vec::new();
        for rule in &self.rules {
            for m in rule.regex.find_iter(full_text) {
                let (page, bboxes) = resolve_geometry(spans, m.start());
                candidates.push(CandidateRedaction {
                    source: CandidateSource::Pattern,
                    rule: rule.name.clone(),
                    matched_text: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    page,
                    bboxes,
                    legal_code: rule.legal_code.clone(),
                    citation: rule.citation.clone(),
                    reason: rule.reason.clone(),
                });
            }
        }
        debug!(
            rules = self.rules.len(),
            candidates = candidates.len(),
            "pattern detection finished"
        );
        candidates
    }
}
