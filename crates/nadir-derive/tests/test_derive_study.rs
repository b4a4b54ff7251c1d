//! Extraction + derivation over the synthetic csv-directory study.

use pretty_assertions::assert_eq;

use nadir_common::{ResponseCategory, StudyConfig};
use nadir_derive::{derive_assessments, AnomalyKind, DerivationOptions, DerivationOutput};
use nadir_ingestion::extract_study;
use nadir_test_utils::{write_csv_study, DERIVED_ROWS, EXCLUDED};

fn derive() -> DerivationOutput {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_csv_study(dir.path()).unwrap();
    let study = extract_study(&inputs).unwrap();
    let opts = DerivationOptions::from_config(&StudyConfig::default()).unwrap();
    derive_assessments(&study, &opts)
}

#[test]
fn test_study_rows() {
    let out = derive();
    assert_eq!(out.rows.len(), DERIVED_ROWS);
    assert!(out.rows.iter().all(|r| r.patient.as_str() != EXCLUDED));
    assert_eq!(out.dropped_undated, 0);

    let kinds: Vec<AnomalyKind> = out.anomalies.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AnomalyKind::ExcludedPatient]);
}

#[test]
fn test_patient_trajectory() {
    let out = derive();
    let p1: Vec<_> = out.rows.iter().filter(|r| r.patient.as_str() == "0101-001").collect();

    let visits: Vec<u32> = p1.iter().map(|r| r.event_num).collect();
    assert_eq!(visits, vec![0, 1, 2, 3]);

    let nadirs: Vec<Option<f64>> = p1.iter().map(|r| r.nadir).collect();
    assert_eq!(nadirs, vec![Some(30.0), Some(24.0), Some(20.0), Some(20.0)]);

    assert_eq!(p1[1].percent_change_from_baseline, Some(-20.0));
    assert_eq!(p1[3].percent_change_from_nadir, Some(40.0));

    let new_lesions: Vec<bool> = p1.iter().map(|r| r.new_lesions).collect();
    assert_eq!(new_lesions, vec![false, false, true, false]);

    assert_eq!(p1[2].marker(ResponseCategory::ProgressiveDisease), Some(2));
    assert_eq!(p1[1].marker(ResponseCategory::StableDisease), Some(1));
}

#[test]
fn test_exactly_one_indicator_per_assessed_visit() {
    let out = derive();
    for row in &out.rows {
        let expected = usize::from(row.response.is_some());
        assert_eq!(row.flags.count(), expected, "{} visit {}", row.patient, row.event_num);
    }
}

#[test]
fn test_nonmeasurable_patient_has_no_percent_change() {
    let out = derive();
    let p3: Vec<_> = out.rows.iter().filter(|r| r.patient.as_str() == "0102-001").collect();
    assert_eq!(p3.len(), 2);
    assert!(p3.iter().all(|r| r.percent_change_from_baseline.is_none()));
    assert!(p3[1].flags.nn);
    assert_eq!(p3[1].sld_category, None);
}
