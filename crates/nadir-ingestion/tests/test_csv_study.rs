//! Extraction over the synthetic csv-directory study.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use nadir_common::{BaselineDisease, NadirError, PatientId};
use nadir_ingestion::extract_study;
use nadir_test_utils::{write_csv_study, COHORT};

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

#[test]
fn test_extracts_cohort_and_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_csv_study(dir.path()).unwrap();
    let study = extract_study(&inputs).unwrap();

    let cohort: Vec<&str> = study.cohort.iter().map(|p| p.as_str()).collect();
    assert_eq!(cohort, COHORT.to_vec());

    let p1 = study
        .baseline
        .iter()
        .find(|b| b.patient.as_str() == "0101-001")
        .unwrap();
    assert_eq!(p1.sum_of_lesions, Some(30.0));
    assert_eq!(p1.disease, BaselineDisease::Measurable);
    assert_eq!(p1.evaluation_date, date(2021, 1, 4));

    let p3 = study
        .baseline
        .iter()
        .find(|b| b.patient.as_str() == "0102-001")
        .unwrap();
    assert_eq!(p3.disease, BaselineDisease::NonMeasurableOnly);
    assert_eq!(p3.sum_of_lesions, None);

    // Not dosed, so never reaches baseline.
    assert!(study.baseline.iter().all(|b| b.patient.as_str() != "0104-001"));
}

#[test]
fn test_extracts_followup_new_lesions_and_responses() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_csv_study(dir.path()).unwrap();
    let study = extract_study(&inputs).unwrap();

    let p1 = PatientId::from("0101-001");
    let sums: Vec<Option<f64>> = study
        .followup
        .iter()
        .filter(|f| f.patient == p1)
        .map(|f| f.sum_of_lesions)
        .collect();
    assert_eq!(sums, vec![Some(24.0), Some(20.0), Some(28.0)]);

    let nt_only = study
        .followup
        .iter()
        .find(|f| f.patient.as_str() == "0102-001")
        .unwrap();
    assert_eq!(nt_only.sum_of_lesions, None);
    assert_eq!(nt_only.nontarget_present, Some(true));

    assert_eq!(study.new_lesions.len(), 1);
    assert_eq!(study.new_lesions[0].event_num, 2);

    assert_eq!(study.responses.len(), 7);
    assert_eq!(
        study.responses[0].overall_response.as_deref(),
        Some("Stable Disease (SD)")
    );
}

#[test]
fn test_missing_sheet_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = write_csv_study(dir.path()).unwrap();
    inputs.overall_response.sheet = "Best Overall Response".into();
    assert!(matches!(
        extract_study(&inputs),
        Err(NadirError::SheetMissing { .. })
    ));
}

#[test]
fn test_missing_workbook_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = write_csv_study(dir.path()).unwrap();
    inputs.medication.path = dir.path().join("nowhere.xlsx");
    assert!(matches!(
        extract_study(&inputs),
        Err(NadirError::WorkbookUnreadable { .. })
    ));
}

#[test]
fn test_missing_column_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = write_csv_study(dir.path()).unwrap();
    // The new-lesion sheet has no longest-diameter column.
    inputs.followup_target.sheet = "New Lesions".into();
    assert!(matches!(
        extract_study(&inputs),
        Err(NadirError::ColumnMissing { .. })
    ));
}
