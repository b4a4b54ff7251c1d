/// Core entity types shared by the extraction, derivation and report stages.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{NadirError, Result};

// ---------------------------------------------------------------------------
// Patient / Site
// ---------------------------------------------------------------------------

/// Case-report-form patient identifier, e.g. `0101-004`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Trims surrounding whitespace; returns None for blank cells.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

/// Clinical site code, the prefix of the patient identifier (e.g. `0101`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteCode(String);

impl SiteCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SiteCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default identifier schema: four-digit site, dash, three-digit subject.
pub const DEFAULT_SITE_PATTERN: &str = r"^(\d{4})-\d{3}$";

/// Named extraction rule mapping a patient identifier to its site.
///
/// The pattern must contain exactly one capture group holding the site code.
/// Identifiers that do not match the schema have no site.
#[derive(Debug, Clone)]
pub struct SiteRule {
    pattern: Regex,
}

impl SiteRule {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| NadirError::Config(format!("invalid site pattern '{pattern}': {e}")))?;
        if pattern.captures_len() != 2 {
            return Err(NadirError::Config(format!(
                "site pattern '{}' must have exactly one capture group",
                pattern.as_str()
            )));
        }
        Ok(Self { pattern })
    }

    pub fn site_of(&self, patient: &PatientId) -> Option<SiteCode> {
        self.pattern
            .captures(patient.as_str())
            .and_then(|caps| caps.get(1))
            .map(|m| SiteCode(m.as_str().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Baseline disease
// ---------------------------------------------------------------------------

/// Which kind of disease a patient had at screening. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineDisease {
    /// At least one target lesion with a measured diameter.
    Measurable,
    /// Only non-target lesions were recorded.
    NonMeasurableOnly,
}

// ---------------------------------------------------------------------------
// Response category
// ---------------------------------------------------------------------------

/// RECIST v1.1 overall response categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResponseCategory {
    ProgressiveDisease,
    CompleteResponse,
    PartialResponse,
    StableDisease,
    NonCrNonPd,
}

impl ResponseCategory {
    /// Indicator order used for columns and chart legends.
    pub const ALL: [ResponseCategory; 5] = [
        ResponseCategory::ProgressiveDisease,
        ResponseCategory::CompleteResponse,
        ResponseCategory::PartialResponse,
        ResponseCategory::StableDisease,
        ResponseCategory::NonCrNonPd,
    ];

    /// Short code written to the `overall_response` column.
    pub fn code(&self) -> &'static str {
        match self {
            ResponseCategory::ProgressiveDisease => "PD",
            ResponseCategory::CompleteResponse   => "CR",
            ResponseCategory::PartialResponse    => "PR",
            ResponseCategory::StableDisease      => "SD",
            ResponseCategory::NonCrNonPd         => "Non-CR/Non-PD",
        }
    }
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Investigator response after label normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalisedResponse {
    Known(ResponseCategory),
    /// Text outside the known CRF labels, passed through verbatim.
    Unmapped(String),
}

impl NormalisedResponse {
    pub fn category(&self) -> Option<ResponseCategory> {
        match self {
            NormalisedResponse::Known(c) => Some(*c),
            NormalisedResponse::Unmapped(_) => None,
        }
    }

    pub fn as_output(&self) -> &str {
        match self {
            NormalisedResponse::Known(c) => c.code(),
            NormalisedResponse::Unmapped(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_site_rule() {
        let rule = SiteRule::new(DEFAULT_SITE_PATTERN).unwrap();
        let site = rule.site_of(&PatientId::from("0101-004")).unwrap();
        assert_eq!(site.as_str(), "0101");
    }

    #[test]
    fn test_site_rule_rejects_malformed_ids() {
        let rule = SiteRule::new(DEFAULT_SITE_PATTERN).unwrap();
        assert!(rule.site_of(&PatientId::from("101-004")).is_none());
        assert!(rule.site_of(&PatientId::from("0101004")).is_none());
        assert!(rule.site_of(&PatientId::from("0101-004-X")).is_none());
    }

    #[test]
    fn test_site_rule_needs_one_group() {
        assert!(SiteRule::new(r"^\d{4}-\d{3}$").is_err());
        assert!(SiteRule::new(r"^(\d{2})(\d{2})-\d{3}$").is_err());
        assert!(SiteRule::new(r"(").is_err());
    }

    #[test]
    fn test_patient_id_trims() {
        assert_eq!(PatientId::parse("  0101-004 ").unwrap().as_str(), "0101-004");
        assert!(PatientId::parse("   ").is_none());
    }

    #[test]
    fn test_unmapped_output_is_verbatim() {
        let r = NormalisedResponse::Unmapped("Not Evaluable".to_string());
        assert_eq!(r.as_output(), "Not Evaluable");
        assert_eq!(r.category(), None);
        let k = NormalisedResponse::Known(ResponseCategory::NonCrNonPd);
        assert_eq!(k.as_output(), "Non-CR/Non-PD");
    }
}
