//! Flat analysis table and its spreadsheet / CSV writers.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use tracing::{info, instrument};

use nadir_common::error::{NadirError, Result};
use nadir_common::{BaselineDisease, ResponseCategory};
use nadir_derive::{Anomaly, DerivedAssessment};

/// Output column order. Matches the field order of [`AssessmentRow`].
pub const COLUMNS: &[&str] = &[
    "patient",
    "site",
    "event_num",
    "evaluation_date",
    "sum_of_lesions",
    "baseline_target",
    "baseline_nontarget",
    "baseline_sld",
    "change_from_baseline",
    "percent_change_from_baseline",
    "nadir",
    "change_from_nadir",
    "percent_change_from_nadir",
    "non_target_lesion_present",
    "new_lesions",
    "target_response",
    "non_target_response",
    "overall_response",
    "pd",
    "cr",
    "pr",
    "sd",
    "nn",
    "pd_this_ta",
    "cr_this_ta",
    "pr_this_ta",
    "sd_this_ta",
    "nn_this_ta",
    "sld_category",
];

pub const ANOMALY_COLUMNS: &[&str] = &["kind", "patient", "event_num", "detail"];

/// One output row. Baseline disease is written as the `0` sentinel in
/// `baseline_target` or `baseline_nontarget`, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRow {
    pub patient: String,
    pub site: Option<String>,
    pub event_num: u32,
    pub evaluation_date: Option<String>,
    pub sum_of_lesions: Option<f64>,
    pub baseline_target: Option<u8>,
    pub baseline_nontarget: Option<u8>,
    pub baseline_sld: Option<f64>,
    pub change_from_baseline: Option<f64>,
    pub percent_change_from_baseline: Option<f64>,
    pub nadir: Option<f64>,
    pub change_from_nadir: Option<f64>,
    pub percent_change_from_nadir: Option<f64>,
    pub non_target_lesion_present: Option<&'static str>,
    pub new_lesions: &'static str,
    pub target_response: Option<String>,
    pub non_target_response: Option<String>,
    pub overall_response: Option<String>,
    pub pd: u8,
    pub cr: u8,
    pub pr: u8,
    pub sd: u8,
    pub nn: u8,
    pub pd_this_ta: Option<u32>,
    pub cr_this_ta: Option<u32>,
    pub pr_this_ta: Option<u32>,
    pub sd_this_ta: Option<u32>,
    pub nn_this_ta: Option<u32>,
    pub sld_category: Option<&'static str>,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

impl From<&DerivedAssessment> for AssessmentRow {
    fn from(a: &DerivedAssessment) -> Self {
        let flag = |c: ResponseCategory| u8::from(a.flags.get(c));
        Self {
            patient: a.patient.to_string(),
            site: a.site.as_ref().map(|s| s.to_string()),
            event_num: a.event_num,
            evaluation_date: a.evaluation_date.map(|d| d.format("%Y-%m-%d").to_string()),
            sum_of_lesions: a.sum_of_lesions,
            baseline_target: (a.baseline_disease == Some(BaselineDisease::Measurable)).then_some(0),
            baseline_nontarget: (a.baseline_disease == Some(BaselineDisease::NonMeasurableOnly)).then_some(0),
            baseline_sld: a.baseline_sld,
            change_from_baseline: a.change_from_baseline,
            percent_change_from_baseline: a.percent_change_from_baseline,
            nadir: a.nadir,
            change_from_nadir: a.change_from_nadir,
            percent_change_from_nadir: a.percent_change_from_nadir,
            non_target_lesion_present: a.nontarget_present.map(yes_no),
            new_lesions: yes_no(a.new_lesions),
            target_response: a.target_response.clone(),
            non_target_response: a.nontarget_response.clone(),
            overall_response: a.response.as_ref().map(|r| r.as_output().to_string()),
            pd: flag(ResponseCategory::ProgressiveDisease),
            cr: flag(ResponseCategory::CompleteResponse),
            pr: flag(ResponseCategory::PartialResponse),
            sd: flag(ResponseCategory::StableDisease),
            nn: flag(ResponseCategory::NonCrNonPd),
            pd_this_ta: a.marker(ResponseCategory::ProgressiveDisease),
            cr_this_ta: a.marker(ResponseCategory::CompleteResponse),
            pr_this_ta: a.marker(ResponseCategory::PartialResponse),
            sd_this_ta: a.marker(ResponseCategory::StableDisease),
            nn_this_ta: a.marker(ResponseCategory::NonCrNonPd),
            sld_category: a.sld_category.map(|c| c.code()),
        }
    }
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

impl<'a> From<Option<&'a str>> for OutputValue<'a> {
    fn from(v: Option<&'a str>) -> Self {
        v.map_or(OutputValue::Empty, OutputValue::Text)
    }
}

impl From<Option<f64>> for OutputValue<'_> {
    fn from(v: Option<f64>) -> Self {
        v.map_or(OutputValue::Empty, OutputValue::Number)
    }
}

impl From<Option<u32>> for OutputValue<'_> {
    fn from(v: Option<u32>) -> Self {
        v.map_or(OutputValue::Empty, |n| OutputValue::Number(f64::from(n)))
    }
}

impl From<Option<u8>> for OutputValue<'_> {
    fn from(v: Option<u8>) -> Self {
        v.map_or(OutputValue::Empty, |n| OutputValue::Number(f64::from(n)))
    }
}

impl AssessmentRow {
    /// Cell values in [`COLUMNS`] order.
    pub fn values(&self) -> Vec<OutputValue<'_>> {
        use OutputValue::{Number, Text};
        vec![
            Text(&self.patient),
            self.site.as_deref().into(),
            Number(f64::from(self.event_num)),
            self.evaluation_date.as_deref().into(),
            self.sum_of_lesions.into(),
            self.baseline_target.into(),
            self.baseline_nontarget.into(),
            self.baseline_sld.into(),
            self.change_from_baseline.into(),
            self.percent_change_from_baseline.into(),
            self.nadir.into(),
            self.change_from_nadir.into(),
            self.percent_change_from_nadir.into(),
            self.non_target_lesion_present.into(),
            Text(self.new_lesions),
            self.target_response.as_deref().into(),
            self.non_target_response.as_deref().into(),
            self.overall_response.as_deref().into(),
            Number(f64::from(self.pd)),
            Number(f64::from(self.cr)),
            Number(f64::from(self.pr)),
            Number(f64::from(self.sd)),
            Number(f64::from(self.nn)),
            self.pd_this_ta.into(),
            self.cr_this_ta.into(),
            self.pr_this_ta.into(),
            self.sd_this_ta.into(),
            self.nn_this_ta.into(),
            self.sld_category.into(),
        ]
    }
}

pub fn to_rows(assessments: &[DerivedAssessment]) -> Vec<AssessmentRow> {
    assessments.iter().map(AssessmentRow::from).collect()
}

// ── Writers ───────────────────────────────────────────────────────────────────

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> NadirError {
    NadirError::Render(format!("xlsx: {e}"))
}

fn write_header(sheet: &mut Worksheet, columns: &[&str], bold: &Format) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *name, bold).map_err(xlsx_err)?;
        sheet.set_column_width(col as u16, (name.len() as f64 + 2.0).max(10.0)).map_err(xlsx_err)?;
    }
    sheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    Ok(())
}

fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: &OutputValue<'_>) -> Result<()> {
    match value {
        OutputValue::Text(s) => sheet.write_string(row, col, *s).map(|_| ()),
        OutputValue::Number(n) => sheet.write_number(row, col, *n).map(|_| ()),
        OutputValue::Empty => Ok(()),
    }
    .map_err(xlsx_err)
}

/// Workbook with an `assessments` sheet and an `anomalies` sheet.
#[instrument(skip(rows, anomalies), fields(path = %path.display()))]
pub fn write_xlsx(path: &Path, rows: &[AssessmentRow], anomalies: &[Anomaly]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet().set_name("assessments").map_err(xlsx_err)?;
    write_header(sheet, COLUMNS, &bold)?;
    for (i, row) in rows.iter().enumerate() {
        for (col, value) in row.values().iter().enumerate() {
            write_value(sheet, i as u32 + 1, col as u16, value)?;
        }
    }

    let sheet = workbook.add_worksheet().set_name("anomalies").map_err(xlsx_err)?;
    write_header(sheet, ANOMALY_COLUMNS, &bold)?;
    for (i, a) in anomalies.iter().enumerate() {
        let r = i as u32 + 1;
        let values = [
            OutputValue::Text(a.kind.as_str()),
            OutputValue::Text(a.patient.as_str()),
            a.event_num.into(),
            OutputValue::Text(&a.detail),
        ];
        for (col, value) in values.iter().enumerate() {
            write_value(sheet, r, col as u16, value)?;
        }
    }

    workbook.save(path).map_err(xlsx_err)?;
    info!(rows = rows.len(), anomalies = anomalies.len(), "Wrote workbook");
    Ok(())
}

#[instrument(skip(rows), fields(path = %path.display()))]
pub fn write_csv(path: &Path, rows: &[AssessmentRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(rows = rows.len(), "Wrote CSV table");
    Ok(())
}
