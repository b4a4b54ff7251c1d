//! Screening (visit 0) extraction.
//!
//! Target lesions are summed per patient; patients with no measured diameter
//! are dropped. Non-target lesions only mark presence. Both sides are joined
//! per patient so each cohort patient has at most one baseline record.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use nadir_common::error::Result;
use nadir_common::{BaselineDisease, PatientId};

use crate::cohort::Cohort;
use crate::models::{columns, BaselineRecord};
use crate::sheet::Table;

#[derive(Debug, Default)]
struct TargetAccumulator {
    sum: Option<f64>,
    date: Option<NaiveDate>,
}

/// Per-patient measurable baseline: (sum of diameters, evaluation date).
fn measurable_baseline(
    table: &Table,
    cohort: &Cohort,
) -> Result<BTreeMap<PatientId, (f64, Option<NaiveDate>)>> {
    let [patient_col, date_col, diameter_col] = table.columns([
        columns::PATIENT,
        columns::EVALUATION_DATE,
        columns::LONGEST_DIAMETER,
    ])?;

    let mut acc: BTreeMap<PatientId, TargetAccumulator> = BTreeMap::new();
    for row in table.rows() {
        let Some(patient) = row.patient(patient_col) else { continue };
        let entry = acc.entry(patient).or_default();
        if let Some(d) = row.get(diameter_col).as_f64() {
            entry.sum = Some(entry.sum.unwrap_or(0.0) + d);
        }
        if entry.date.is_none() {
            entry.date = row.get(date_col).as_date();
        }
    }

    let total = acc.len();
    let out: BTreeMap<_, _> = acc
        .into_iter()
        .filter_map(|(patient, a)| a.sum.map(|sum| (patient, (sum, a.date))))
        .filter(|(patient, _)| cohort.contains(patient))
        .collect();
    debug!(patients = total, measurable = out.len(), "Baseline target lesions summed");
    Ok(out)
}

/// Patients with a non-target lesion flagged present at screening.
fn nonmeasurable_baseline(
    table: &Table,
    cohort: &Cohort,
) -> Result<BTreeMap<PatientId, Option<NaiveDate>>> {
    let [patient_col, date_col, present_col] = table.columns([
        columns::PATIENT,
        columns::EVALUATION_DATE,
        columns::NONTARGET_PRESENT,
    ])?;

    let mut out: BTreeMap<PatientId, Option<NaiveDate>> = BTreeMap::new();
    for row in table.rows() {
        let Some(patient) = row.patient(patient_col) else { continue };
        if row.get(present_col).as_flag() != Some(true) || !cohort.contains(&patient) {
            continue;
        }
        let date = row.get(date_col).as_date();
        let slot = out.entry(patient).or_insert(None);
        if slot.is_none() {
            *slot = date;
        }
    }
    Ok(out)
}

/// Join target and non-target screening sheets into one record per patient.
pub fn extract_baseline(
    target: &Table,
    nontarget: &Table,
    cohort: &Cohort,
) -> Result<Vec<BaselineRecord>> {
    let measurable = measurable_baseline(target, cohort)?;
    let mut nonmeasurable = nonmeasurable_baseline(nontarget, cohort)?;

    let mut records: Vec<BaselineRecord> = measurable
        .into_iter()
        .map(|(patient, (sum, date))| {
            let nt_date = nonmeasurable.remove(&patient).flatten();
            BaselineRecord {
                patient,
                evaluation_date: date.or(nt_date),
                sum_of_lesions: Some(sum),
                disease: BaselineDisease::Measurable,
            }
        })
        .collect();

    records.extend(nonmeasurable.into_iter().map(|(patient, date)| BaselineRecord {
        patient,
        evaluation_date: date,
        sum_of_lesions: None,
        disease: BaselineDisease::NonMeasurableOnly,
    }));
    records.sort_by(|a, b| a.patient.cmp(&b.patient));

    info!(
        records = records.len(),
        measurable = records.iter().filter(|r| r.disease == BaselineDisease::Measurable).count(),
        "Baseline extracted"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn cohort(ids: &[&str]) -> Cohort {
        ids.iter().map(|s| PatientId::from(*s)).collect()
    }

    fn target(rows: &[(&str, &str, Option<f64>)]) -> Table {
        Table::new(
            "Target Lesions",
            vec!["Patient".into(), "Evaluation Date".into(), "Longest Diameter".into()],
            rows.iter()
                .map(|(p, d, v)| {
                    vec![Cell::text(p), Cell::text(d), v.map(Cell::Number).unwrap_or(Cell::Empty)]
                })
                .collect(),
        )
    }

    fn nontarget(rows: &[(&str, &str, &str)]) -> Table {
        Table::new(
            "Non-Target Lesions",
            vec!["Patient".into(), "Evaluation Date".into(), "Non-Target Lesion Present".into()],
            rows.iter()
                .map(|(p, d, f)| vec![Cell::text(p), Cell::text(d), Cell::text(f)])
                .collect(),
        )
    }

    #[test]
    fn test_target_rows_are_summed() {
        let records = extract_baseline(
            &target(&[("P1", "2023-01-02", Some(10.0)), ("P1", "2023-01-02", Some(20.0))]),
            &nontarget(&[]),
            &cohort(&["P1"]),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sum_of_lesions, Some(30.0));
        assert_eq!(records[0].disease, BaselineDisease::Measurable);
        assert_eq!(records[0].evaluation_date, NaiveDate::from_ymd_opt(2023, 1, 2));
    }

    #[test]
    fn test_nonmeasurable_only_when_no_target() {
        let records = extract_baseline(
            &target(&[("P1", "2023-01-02", Some(15.0)), ("P2", "2023-01-03", None)]),
            &nontarget(&[
                ("P1", "2023-01-02", "Yes"),
                ("P2", "2023-01-04", "Yes"),
                ("P3", "2023-01-05", "No"),
            ]),
            &cohort(&["P1", "P2", "P3"]),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].patient.as_str(), "P1");
        assert_eq!(records[0].disease, BaselineDisease::Measurable);
        assert_eq!(records[1].patient.as_str(), "P2");
        assert_eq!(records[1].disease, BaselineDisease::NonMeasurableOnly);
        assert_eq!(records[1].sum_of_lesions, None);
        assert_eq!(records[1].evaluation_date, NaiveDate::from_ymd_opt(2023, 1, 4));
    }

    #[test]
    fn test_restricted_to_cohort() {
        let records = extract_baseline(
            &target(&[("P1", "2023-01-02", Some(15.0)), ("P9", "2023-01-02", Some(15.0))]),
            &nontarget(&[("P8", "2023-01-02", "Yes")]),
            &cohort(&["P1"]),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].patient.as_str(), "P1");
    }
}
