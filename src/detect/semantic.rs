//! Semantic detector.
//!
//! Sends a bounded excerpt of the extraction stream to the classification
//! service and turns its suggestions into candidates. This detector is
//! best-effort end to end: network failures, timeouts, and unparsable
//! responses all degrade to an empty result and never fail the request.
//! The response is treated as an untrusted variant structure; malformed
//! entries are skipped one by one.

use async_trait::async_trait;
use regex::RegexBuilder;
use tracing::{debug, warn};

use crate::config::RedactionConfig;
use crate::detect::resolve_geometry;
use crate::error::{Error, Result};
use crate::types::{CandidateRedaction, CandidateSource, TextSpan};

/// Rule name recorded on every semantic candidate.
const SEMANTIC_RULE: &str = "llm_identified";
/// Defaults applied when a suggestion omits its legal code.
const DEFAULT_CODE: &str = "GENERAL";
const DEFAULT_CITATION: &str = "California Privacy Laws";
const DEFAULT_REASON: &str = "Identified as sensitive information";

/// One classification call: prompt in, free-form text out.
#[async_trait]
pub trait ClassificationClient: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<String>;
}

pub struct SemanticDetector<C> {
    client: C,
}

impl<C: ClassificationClient> SemanticDetector<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Detect candidates over the full stream. Each suggested literal is
    /// re-located by exact, case-insensitive search; one candidate is
    /// emitted per occurrence, with page geometry resolved through the
    /// positional index. Suggestions whose literal never re-locates yield
    /// no candidate at all.
    pub async fn detect(
        &self,
        full_text: &str,
        spans: &[TextSpan],
        config: &RedactionConfig,
    ) -> Vec<CandidateRedaction> {
        let excerpt = truncate_chars(full_text, config.semantic.excerpt_chars);
        let prompt = build_prompt(config, excerpt);

        let response =
            match tokio::time::timeout(config.semantic.timeout, self.client.classify(&prompt))
                .await
            {
                Ok(Ok(body)) => body,
                Ok(Err(e)) => {
                    warn!(%e, "classification call failed; semantic detection degrades to empty");
                    return Vec::new();
                }
                Err(_) => {
                    warn!(
                        timeout = ?config.semantic.timeout,
                        "classification call timed out; semantic detection degrades to empty"
                    );
                    return Vec::new();
                }
            };

        let suggestions = match parse_suggestions(&response) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(%e, "unparsable classification response; semantic detection degrades to empty");
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for suggestion in &suggestions {
            let Ok(regex) = RegexBuilder::new(&regex::escape(&suggestion.text))
                .case_insensitive(true)
                .build()
            else {
                continue;
            };
            for m in regex.find_iter(full_text) {
                let (page, bboxes) = resolve_geometry(spans, m.start());
                let legal_code = suggestion
                    .code
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CODE.to_string());
                let citation = match &suggestion.code {
                    Some(code) => config.categories.citation_for(code),
                    None => DEFAULT_CITATION.to_string(),
                };
                candidates.push(CandidateRedaction {
                    source: CandidateSource::Semantic,
                    rule: SEMANTIC_RULE.to_string(),
                    matched_text: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    page,
                    bboxes,
                    legal_code,
                    citation,
                    reason: suggestion
                        .reason
                        .clone()
                        .unwrap_or_else(|| DEFAULT_REASON.to_string()),
                });
            }
        }
        debug!(
            suggestions = suggestions.len(),
            candidates = candidates.len(),
            "semantic detection finished"
        );
        candidates
    }
}

struct Suggestion {
    text: String,
    code: Option<String>,
    reason: Option<String>,
}

/// Parse the service response as a JSON array of `{text, code, reason}`.
/// Chat models routinely wrap JSON in a markdown fence; one is stripped
/// before parsing. Entries without a non-empty `text` are dropped.
fn parse_suggestions(raw: &str) -> Result<Vec<Suggestion>> {
    let body = strip_fence(raw);
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::ResponseParse(format!("not a JSON document: {e}")))?;
    let entries = value
        .as_array()
        .ok_or_else(|| Error::ResponseParse("response is not a JSON array".into()))?;

    let mut suggestions = Vec::new();
    for entry in entries {
        let Some(text) = entry.get("text").and_then(|v| v.as_str()) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        suggestions.push(Suggestion {
            text: text.to_string(),
            code: entry
                .get("code")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            reason: entry
                .get("reason")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });
    }
    Ok(suggestions)
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Truncate to a character budget without splitting a UTF-8 sequence.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Build the classification prompt: legal-expert framing, the table's
/// classifier-only categories as focus guidance, and the structured output
/// instruction.
fn build_prompt(config: &RedactionConfig, excerpt: &str) -> String {
    let mut focus = String::new();
    for category in config.categories.semantic_categories() {
        focus.push_str("- ");
        focus.push_str(&category.reason);
        focus.push('\n');
    }

    format!(
        "You are a legal expert specializing in California privacy and redaction laws. \
Analyze this legal document excerpt and identify information that must be redacted \
according to California law.\n\n\
For each item that needs redaction, provide:\n\
1. The exact text to redact\n\
2. The specific California law code requiring redaction\n\
3. A brief legal reason\n\n\
Focus on these categories:\n{focus}\n\
Return your response as a JSON array with objects containing:\n\
{{\"text\": \"exact text to redact\", \"code\": \"legal code reference\", \"reason\": \"brief explanation\"}}\n\n\
Document excerpt:\n{excerpt}"
    )
}
