//! nadir-report: Output stage.
//! Writes the derived analysis table (xlsx / csv) and one SVG per clinical
//! site pairing a visit timeline with a percent-change spider chart.

pub mod palette;
pub mod table;
pub mod charts;

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, instrument};

use nadir_common::error::Result;
use nadir_common::study_config::OutputConfig;
use nadir_common::{RecistThresholds, SiteCode};
use nadir_derive::DerivationOutput;

pub use table::{to_rows, write_csv, write_xlsx, AssessmentRow, COLUMNS};
pub use charts::{group_by_site, render_site_charts};

/// Files produced by [`write_report`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportFiles {
    pub files: Vec<PathBuf>,
    pub sites: Vec<SiteCode>,
}

/// Write every enabled output into `output.dir`, creating it if needed.
#[instrument(skip_all, fields(dir = %output.dir.display()))]
pub fn write_report(
    derived: &DerivationOutput,
    output: &OutputConfig,
    thresholds: &RecistThresholds,
) -> Result<ReportFiles> {
    fs::create_dir_all(&output.dir)?;
    let rows = to_rows(&derived.rows);
    let mut report = ReportFiles::default();

    if output.write_xlsx {
        let path = output.dir.join(format!("{}.xlsx", output.table_name));
        write_xlsx(&path, &rows, &derived.anomalies)?;
        report.files.push(path);
    }
    if output.write_csv {
        let path = output.dir.join(format!("{}.csv", output.table_name));
        write_csv(&path, &rows)?;
        report.files.push(path);
    }
    if output.render_charts {
        report.sites = group_by_site(&derived.rows).into_keys().collect();
        report.files.extend(render_site_charts(&output.dir, &derived.rows, thresholds)?);
    }

    info!(files = report.files.len(), sites = report.sites.len(), "Report written");
    Ok(report)
}
