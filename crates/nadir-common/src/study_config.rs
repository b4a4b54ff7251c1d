//! Study configuration for a derivation run.
//!
//! Describes where each CRF export lives, which patients are excluded, the
//! identifier schema used to derive sites, RECIST thresholds, and output options.
//! Every field has a default so a partial file is enough.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entities::{SiteRule, DEFAULT_SITE_PATTERN};
use crate::error::{NadirError, Result};

/// Complete study configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Input sheets
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Patients removed before derivation
    #[serde(default)]
    pub exclusions: ExclusionConfig,

    /// Patient identifier schema
    #[serde(default)]
    pub site: SiteConfig,

    /// RECIST reference thresholds
    #[serde(default)]
    pub thresholds: RecistThresholds,

    /// Output options
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging options
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Location of one sheet: workbook path (or csv directory), sheet name and
/// 0-based header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSpec {
    pub path: PathBuf,
    pub sheet: String,
    #[serde(default)]
    pub header_row: usize,
}

impl SheetSpec {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>, header_row: usize) -> Self {
        Self { path: path.into(), sheet: sheet.into(), header_row }
    }
}

/// The seven sheets read from the four CRF workbooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_medication")]
    pub medication: SheetSpec,
    #[serde(default = "default_screening_target")]
    pub screening_target: SheetSpec,
    #[serde(default = "default_screening_nontarget")]
    pub screening_nontarget: SheetSpec,
    #[serde(default = "default_followup_target")]
    pub followup_target: SheetSpec,
    #[serde(default = "default_followup_nontarget")]
    pub followup_nontarget: SheetSpec,
    #[serde(default = "default_new_lesions")]
    pub new_lesions: SheetSpec,
    #[serde(default = "default_overall_response")]
    pub overall_response: SheetSpec,
}

const DEFAULT_HEADER_ROW: usize = 1;

fn default_medication() -> SheetSpec {
    SheetSpec::new("data/medication_intake.xlsx", "Study Drug Administration", DEFAULT_HEADER_ROW)
}
fn default_screening_target() -> SheetSpec {
    SheetSpec::new("data/screening.xlsx", "Target Lesions", DEFAULT_HEADER_ROW)
}
fn default_screening_nontarget() -> SheetSpec {
    SheetSpec::new("data/screening.xlsx", "Non-Target Lesions", DEFAULT_HEADER_ROW)
}
fn default_followup_target() -> SheetSpec {
    SheetSpec::new("data/tumor_assessment.xlsx", "Target Lesions", DEFAULT_HEADER_ROW)
}
fn default_followup_nontarget() -> SheetSpec {
    SheetSpec::new("data/tumor_assessment.xlsx", "Non-Target Lesions", DEFAULT_HEADER_ROW)
}
fn default_new_lesions() -> SheetSpec {
    SheetSpec::new("data/tumor_assessment.xlsx", "New Lesions", DEFAULT_HEADER_ROW)
}
fn default_overall_response() -> SheetSpec {
    SheetSpec::new("data/tumor_assessment.xlsx", "Overall Response", DEFAULT_HEADER_ROW)
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            medication: default_medication(),
            screening_target: default_screening_target(),
            screening_nontarget: default_screening_nontarget(),
            followup_target: default_followup_target(),
            followup_nontarget: default_followup_nontarget(),
            new_lesions: default_new_lesions(),
            overall_response: default_overall_response(),
        }
    }
}

impl InputsConfig {
    /// Resolve relative paths against `base` (the directory holding the config file).
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for spec in [
            &mut self.medication,
            &mut self.screening_target,
            &mut self.screening_nontarget,
            &mut self.followup_target,
            &mut self.followup_nontarget,
            &mut self.new_lesions,
            &mut self.overall_response,
        ] {
            if spec.path.is_relative() {
                spec.path = base.join(&spec.path);
            }
        }
    }
}

// ── Exclusions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionConfig {
    /// Patient ids dropped before derivation (no usable baseline).
    #[serde(default = "default_excluded_patients")]
    pub patients: Vec<String>,
}

fn default_excluded_patients() -> Vec<String> { vec!["0103-004".to_string()] }

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self { patients: default_excluded_patients() }
    }
}

// ── Site ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Regex with one capture group holding the site code.
    #[serde(default = "default_site_pattern")]
    pub pattern: String,
}

fn default_site_pattern() -> String { DEFAULT_SITE_PATTERN.to_string() }

impl Default for SiteConfig {
    fn default() -> Self {
        Self { pattern: default_site_pattern() }
    }
}

// ── Thresholds ────────────────────────────────────────────────────────────────

/// RECIST v1.1 reference thresholds, in percent and millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecistThresholds {
    /// Increase from nadir marking progression
    #[serde(default = "default_progression_pct")]
    pub progression_pct: f64,

    /// Decrease from baseline marking partial response (negative)
    #[serde(default = "default_response_pct")]
    pub response_pct: f64,

    /// Minimum absolute SLD increase from nadir for progression
    #[serde(default = "default_progression_min_mm")]
    pub progression_min_mm: f64,
}

fn default_progression_pct() -> f64 { 20.0 }
fn default_response_pct() -> f64 { -30.0 }
fn default_progression_min_mm() -> f64 { 5.0 }

impl Default for RecistThresholds {
    fn default() -> Self {
        Self {
            progression_pct: default_progression_pct(),
            response_pct: default_response_pct(),
            progression_min_mm: default_progression_min_mm(),
        }
    }
}

impl RecistThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.progression_pct <= 0.0 {
            return Err(NadirError::Config(format!(
                "thresholds.progression_pct must be positive, got {}", self.progression_pct
            )));
        }
        if self.response_pct >= 0.0 {
            return Err(NadirError::Config(format!(
                "thresholds.response_pct must be negative, got {}", self.response_pct
            )));
        }
        if self.progression_min_mm < 0.0 {
            return Err(NadirError::Config(format!(
                "thresholds.progression_min_mm must not be negative, got {}", self.progression_min_mm
            )));
        }
        Ok(())
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the table, charts and run summary
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// File stem of the merged table
    #[serde(default = "default_table_name")]
    pub table_name: String,

    #[serde(default = "default_true")]
    pub write_xlsx: bool,

    #[serde(default)]
    pub write_csv: bool,

    /// One chart per site
    #[serde(default = "default_true")]
    pub render_charts: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_table_name() -> String { "recist_derived".to_string() }
fn default_true() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            table_name: default_table_name(),
            write_xlsx: true,
            write_csv: false,
            render_charts: true,
        }
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "nadir=debug,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl StudyConfig {
    /// Load from a file, choosing the format from the extension
    /// (`.yaml`/`.yml`, `.json`, anything else is TOML).
    pub fn from_path(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading study configuration");
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Ok(serde_json::from_str(&content)?),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| NadirError::Config(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| NadirError::Config(e.to_string()))
    }

    /// Serialise to TOML, e.g. to write a starter config.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| NadirError::Config(e.to_string()))
    }

    /// Build the site extraction rule from `site.pattern`.
    pub fn site_rule(&self) -> Result<SiteRule> {
        SiteRule::new(&self.site.pattern)
    }

    /// Reject configurations that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        self.site_rule()?;
        self.thresholds.validate()?;
        if !self.output.write_xlsx && !self.output.write_csv {
            return Err(NadirError::Config(
                "output.write_xlsx and output.write_csv are both disabled".to_string(),
            ));
        }
        if self.output.table_name.trim().is_empty() {
            return Err(NadirError::Config("output.table_name is empty".to_string()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
