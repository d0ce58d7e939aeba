//! Configuration for the redaction pipeline.
//!
//! Everything the detectors and the orchestrator consult is built here
//! once, at process start, and passed down by reference; detection logic
//! performs no ambient/global lookups. The category table is the single
//! source of truth for deterministic rules and for the classifier's
//! category guidance, and can be replaced from a YAML file without code
//! changes.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One redaction category. Categories with a `pattern` drive the pattern
/// detector; categories without one are handed to the classification
/// service as guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionCategory {
    pub name: String,
    #[serde(default)]
    pub pattern: Option<String>,
    pub legal_code: String,
    pub reason: String,
}

/// Ordered category table plus the legal-code citation texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTable {
    pub categories: Vec<RedactionCategory>,
    /// Legal code identifier -> human-readable citation.
    pub codes: BTreeMap<String, String>,
}

impl CategoryTable {
    /// The built-in California table.
    pub fn california() -> Self {
        let codes: BTreeMap<String, String> = [
            ("CCP_1798.3", "California Civil Code § 1798.3 - Prohibits disclosure of personal information"),
            ("WIC_827", "California Welfare and Institutions Code § 827 - Confidentiality of juvenile records"),
            ("PC_293", "California Penal Code § 293 - Protection of sexual assault victim information"),
            ("PC_841.5", "California Penal Code § 841.5 - Confidentiality of informant information"),
            ("EC_1040", "California Evidence Code § 1040 - Privilege for official information"),
            ("CRC_2.550", "California Rules of Court 2.550 - Sealed records requirements"),
            ("FC_3042", "California Family Code § 3042 - Protection of minor's information in custody proceedings"),
            ("HSC_123100", "California Health and Safety Code § 123100 - Medical information confidentiality"),
            ("CCPA", "California Consumer Privacy Act - Protection of personal information"),
            ("GOV_6254", "California Government Code § 6254 - Exemptions from public records disclosure"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let category = |name: &str, pattern: Option<&str>, code: &str, reason: &str| {
            RedactionCategory {
                name: name.to_string(),
                pattern: pattern.map(str::to_string),
                legal_code: code.to_string(),
                reason: reason.to_string(),
            }
        };

        let categories = vec![
            category(
                "ssn",
                Some(r"\b\d{3}-\d{2}-\d{4}\b|\b\d{9}\b"),
                "CCP_1798.3",
                "Social Security numbers must be redacted per California Civil Code § 1798.3",
            ),
            category(
                "driver_license",
                Some(r"\b[A-Z]\d{7}\b"),
                "GOV_6254",
                "Driver's license numbers are exempt from disclosure under Government Code § 6254(c)",
            ),
            category(
                "phone",
                Some(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b"),
                "CCPA",
                "Phone numbers may constitute personal information under CCPA",
            ),
            category(
                "email",
                Some(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
                "CCPA",
                "Email addresses are personal information protected under CCPA",
            ),
            category(
                "credit_card",
                Some(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b"),
                "CCP_1798.3",
                "Financial account numbers must be redacted per Civil Code § 1798.3",
            ),
            category(
                "bank_account",
                Some(r"\b\d{8,17}\b"),
                "CCP_1798.3",
                "Bank account numbers are protected financial information",
            ),
            category(
                "date_of_birth",
                Some(r"\b(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])/(\d{4}|\d{2})\b"),
                "GOV_6254",
                "Full dates of birth are exempt from disclosure",
            ),
            // Classifier-only categories: no deterministic pattern exists.
            category(
                "minor_name",
                None,
                "WIC_827",
                "Names of minors (Welfare & Institutions Code § 827)",
            ),
            category(
                "sexual_assault_victim",
                None,
                "PC_293",
                "Sexual assault victim names (Penal Code § 293)",
            ),
            category(
                "confidential_informant",
                None,
                "PC_841.5",
                "Confidential informant identities (Penal Code § 841.5)",
            ),
            category(
                "medical_information",
                None,
                "HSC_123100",
                "Medical/psychological information (Health & Safety Code § 123100)",
            ),
            category(
                "witness_address",
                None,
                "GOV_6254",
                "Witness home addresses in criminal cases (Government Code § 6254)",
            ),
        ];

        Self { categories, codes }
    }

    /// Load a replacement table from a YAML file.
    pub fn from_yaml_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::Config(format!("invalid category table: {e}")))
    }

    /// Human-readable citation for a legal code, falling back to the code
    /// itself when the table carries no text for it.
    pub fn citation_for(&self, legal_code: &str) -> String {
        self.codes
            .get(legal_code)
            .cloned()
            .unwrap_or_else(|| legal_code.to_string())
    }

    /// Categories that carry a deterministic detection pattern, in table order.
    pub fn pattern_categories(&self) -> impl Iterator<Item = &RedactionCategory> {
        self.categories.iter().filter(|c| c.pattern.is_some())
    }

    /// Categories left to the classification service, in table order.
    pub fn semantic_categories(&self) -> impl Iterator<Item = &RedactionCategory> {
        self.categories.iter().filter(|c| c.pattern.is_none())
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::california()
    }
}

/// Settings for the external classification service.
#[derive(Debug, Clone)]
pub struct SemanticConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Character budget for the document excerpt sent to the service.
    pub excerpt_chars: usize,
    /// Hard deadline for one classification call; expiry degrades the
    /// semantic detector to an empty result.
    pub timeout: Duration,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            excerpt_chars: 10_000,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Global pipeline execution config, constructed once at process start.
#[derive(Debug, Clone, Default)]
pub struct RedactionConfig {
    pub categories: CategoryTable,
    pub semantic: SemanticConfig,
}
