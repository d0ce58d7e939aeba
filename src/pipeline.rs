//! Redaction pipeline orchestration.
//!
//! Composes extraction, the two detectors, the merger, and the applicator
//! into the end-to-end "redact a document" operation, plus the secondary
//! trusted-application mode. Extraction and saving fail fast; semantic
//! detection degrades to empty on any failure, so an unavailable
//! classification service can shrink the redaction set but never block it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::apply::RedactionApplicator;
use crate::config::RedactionConfig;
use crate::detect::pattern::PatternDetector;
use crate::detect::semantic::{ClassificationClient, SemanticDetector};
use crate::engine::DocumentEngine;
use crate::error::{Error, Result};
use crate::extract::extract_text_with_positions;
use crate::merge::merge_candidates;
use crate::types::AppliedRedaction;

/// Outcome of one redaction request: where the redacted document was
/// written, the full audit trail, and the count of occurrences actually
/// removed (`applied == true` records only, so under-redaction is visible
/// to the caller rather than hidden).
#[derive(Debug, Serialize)]
pub struct RedactionReport {
    pub output_path: PathBuf,
    pub redactions: Vec<AppliedRedaction>,
    pub total_redactions: usize,
}

pub struct Redactor<E, C> {
    engine: E,
    pattern: PatternDetector,
    semantic: SemanticDetector<C>,
    applicator: RedactionApplicator,
    config: RedactionConfig,
}

impl<E: DocumentEngine, C: ClassificationClient> Redactor<E, C> {
    pub fn new(engine: E, client: C, config: RedactionConfig) -> Self {
        Self {
            engine,
            pattern: PatternDetector::from_table(&config.categories),
            semantic: SemanticDetector::new(client),
            applicator: RedactionApplicator::new(),
            config,
        }
    }

    /// Detect and destructively apply every redaction in `input`, writing
    /// the result to `output`. The input file is never modified.
    #[instrument(skip(self))]
    pub async fn redact_document(&self, input: &Path, output: &Path) -> Result<RedactionReport> {
        if input == output {
            return Err(Error::Config(
                "output path must differ from the input path".into(),
            ));
        }

        let mut handle = self.engine.open(input)?;
        let (full_text, spans) = extract_text_with_positions(&handle)?;

        // Independent detectors; the semantic one joins (or degrades to
        // empty) before merging.
        let (mut candidates, semantic_candidates) = tokio::join!(
            async { self.pattern.detect(&full_text, &spans) },
            self.semantic.detect(&full_text, &spans, &self.config),
        );
        candidates.extend(semantic_candidates);
        let merged = merge_candidates(candidates);

        let redactions = self
            .applicator
            .apply_candidates(&mut handle, &merged, output)?;
        let total_redactions = redactions.iter().filter(|r| r.applied).count();
        info!(total_redactions, "document redacted");

        Ok(RedactionReport {
            output_path: output.to_path_buf(),
            redactions,
            total_redactions,
        })
    }

    /// Secondary mode: apply a caller-supplied redaction set, trusting its
    /// geometry. Returns the number of rectangles applied.
    #[instrument(skip(self, records))]
    pub async fn apply_redactions(
        &self,
        input: &Path,
        records: &[AppliedRedaction],
        output: &Path,
    ) -> Result<usize> {
        if input == output {
            return Err(Error::Config(
                "output path must differ from the input path".into(),
            ));
        }
        let mut handle = self.engine.open(input)?;
        self.applicator.apply_records(&mut handle, records, output)
    }
}
