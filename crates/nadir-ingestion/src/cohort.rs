//! Intention-to-Treat cohort: patients dosed at cycle 1 day 1.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use nadir_common::error::Result;
use nadir_common::PatientId;

use crate::models::columns;
use crate::sheet::Table;

/// Medication-intake event number for cycle 1 day 1.
pub const FIRST_DOSE_EVENT: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cohort {
    patients: BTreeSet<PatientId>,
}

impl Cohort {
    /// Select patients with `event_num == 1` and `dose_taken == "Yes"`.
    pub fn from_medication(table: &Table) -> Result<Self> {
        let [patient_col, event_col, dose_col] =
            table.columns([columns::PATIENT, columns::EVENT_NUM, columns::DOSE_TAKEN])?;

        let mut patients = BTreeSet::new();
        for row in table.rows() {
            let Some(patient) = row.patient(patient_col) else { continue };
            if row.get(event_col).as_u32() != Some(FIRST_DOSE_EVENT) {
                continue;
            }
            if row.get(dose_col).as_flag() == Some(true) {
                patients.insert(patient);
            } else {
                debug!(patient = %patient, "No first dose recorded");
            }
        }

        info!(patients = patients.len(), "Intention-to-Treat cohort built");
        Ok(Self { patients })
    }

    pub fn contains(&self, patient: &PatientId) -> bool {
        self.patients.contains(patient)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatientId> {
        self.patients.iter()
    }
}

impl FromIterator<PatientId> for Cohort {
    fn from_iter<I: IntoIterator<Item = PatientId>>(iter: I) -> Self {
        Self { patients: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn medication(rows: &[(&str, f64, &str)]) -> Table {
        Table::new(
            "EX",
            vec!["Patient".into(), "Event Num".into(), "Dose Taken".into()],
            rows.iter()
                .map(|(p, e, d)| vec![Cell::text(p), Cell::Number(*e), Cell::text(d)])
                .collect(),
        )
    }

    #[test]
    fn test_first_dose_filter() {
        let table = medication(&[
            ("0101-001", 1.0, "Yes"),
            ("0101-002", 1.0, "No"),
            ("0101-003", 2.0, "Yes"),
            ("0102-001", 1.0, "yes"),
        ]);
        let cohort = Cohort::from_medication(&table).unwrap();
        assert_eq!(cohort.len(), 2);
        assert!(cohort.contains(&PatientId::from("0101-001")));
        assert!(cohort.contains(&PatientId::from("0102-001")));
        assert!(!cohort.contains(&PatientId::from("0101-003")));
    }

    #[test]
    fn test_missing_dose_column_is_fatal() {
        let table = Table::new("EX", vec!["Patient".into(), "Event Num".into()], vec![]);
        assert!(Cohort::from_medication(&table).is_err());
    }
}
