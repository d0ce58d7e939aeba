//! Legal-document redaction pipeline for PDFs.
//!
//! Two independent detectors propose sensitive spans over a positional
//! text index: a deterministic pattern table bound to legal citations, and
//! an external natural-language classifier consumed best-effort. The
//! merged set is destructively flattened out of the page content, and
//! every redaction (applied or not) is returned as an auditable record.

// Configuration and core pipeline
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Document engine seam (lopdf-backed implementation included)
pub mod engine;

// Stages: extraction, detection, merge, application
pub mod apply;
pub mod detect;
pub mod extract;
pub mod merge;

#[cfg(test)]
mod testutil;

// Re-exports for crate consumers
pub use apply::RedactionApplicator;
pub use config::{CategoryTable, RedactionConfig, SemanticConfig};
pub use detect::openai::OpenAiClient;
pub use detect::pattern::PatternDetector;
pub use detect::semantic::{ClassificationClient, SemanticDetector};
pub use engine::lopdf_engine::LopdfEngine;
pub use engine::{DocumentEngine, DocumentHandle};
pub use error::{Error, Result};
pub use pipeline::{RedactionReport, Redactor};
pub use types::{AppliedRedaction, CandidateRedaction, CandidateSource, Rect, TextSpan};
