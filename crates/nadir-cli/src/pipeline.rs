//! One end-to-end run: extract, derive, report, summarise.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use nadir_common::{SiteCode, StudyConfig};
use nadir_derive::anomalies::count_by_kind;
use nadir_derive::{derive_assessments, AnomalyKind, DerivationOptions};
use nadir_ingestion::extract_study;
use nadir_report::write_report;

pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config_source: Option<PathBuf>,
    pub cohort: usize,
    pub rows: usize,
    pub dropped_undated: usize,
    pub dropped_outside_cohort: usize,
    pub anomalies: BTreeMap<AnomalyKind, usize>,
    pub sites: Vec<SiteCode>,
    pub files: Vec<PathBuf>,
    pub duration_ms: u64,
}

#[instrument(skip_all, fields(run_id))]
pub fn run(config: &StudyConfig, config_source: Option<&Path>) -> anyhow::Result<RunSummary> {
    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));
    let started_at = Utc::now();
    let clock = Instant::now();

    let study = extract_study(&config.inputs).context("Failed to read CRF exports")?;
    let opts = DerivationOptions::from_config(config)?;
    let derived = derive_assessments(&study, &opts);
    let report = write_report(&derived, &config.output, &config.thresholds)
        .with_context(|| format!("Failed to write report to {}", config.output.dir.display()))?;

    let summary_path = config.output.dir.join(SUMMARY_FILE);
    let mut files = report.files;
    files.push(summary_path.clone());

    let summary = RunSummary {
        run_id,
        started_at,
        config_source: config_source.map(Path::to_path_buf),
        cohort: study.cohort.len(),
        rows: derived.rows.len(),
        dropped_undated: derived.dropped_undated,
        dropped_outside_cohort: derived.dropped_outside_cohort,
        anomalies: count_by_kind(&derived.anomalies),
        sites: report.sites,
        files,
        duration_ms: clock.elapsed().as_millis() as u64,
    };
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    info!(
        cohort = summary.cohort,
        rows = summary.rows,
        anomalies = derived.anomalies.len(),
        sites = summary.sites.len(),
        duration_ms = summary.duration_ms,
        "Run complete"
    );
    Ok(summary)
}
