//! First new-lesion visit per patient.
//!
//! A single new lesion already implies progression, so only the earliest
//! record is kept (lowest visit number, sheet order breaking ties).

use std::collections::BTreeMap;

use tracing::info;

use nadir_common::error::Result;
use nadir_common::PatientId;

use crate::models::{columns, NewLesionRecord};
use crate::sheet::Table;

pub fn extract_new_lesions(table: &Table) -> Result<Vec<NewLesionRecord>> {
    let [patient_col, event_col, date_col] =
        table.columns([columns::PATIENT, columns::EVENT_NUM, columns::EVALUATION_DATE])?;

    let mut first: BTreeMap<PatientId, NewLesionRecord> = BTreeMap::new();
    for row in table.rows() {
        let (Some(patient), Some(event_num)) = (row.patient(patient_col), row.get(event_col).as_u32())
        else {
            continue;
        };
        let candidate = NewLesionRecord {
            patient: patient.clone(),
            event_num,
            evaluation_date: row.get(date_col).as_date(),
        };
        match first.get(&patient) {
            Some(existing) if existing.event_num <= event_num => {}
            _ => {
                first.insert(patient, candidate);
            }
        }
    }

    let records: Vec<NewLesionRecord> = first.into_values().collect();
    info!(patients = records.len(), "New-lesion visits extracted");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;
    use chrono::NaiveDate;

    #[test]
    fn test_keeps_earliest_visit() {
        let table = Table::new(
            "New Lesions",
            vec!["Patient".into(), "EVENT_NUM".into(), "Evaluation Date".into()],
            vec![
                vec![Cell::text("P1"), Cell::Number(3.0), Cell::text("2023-07-01")],
                vec![Cell::text("P1"), Cell::Number(2.0), Cell::text("2023-05-01")],
                vec![Cell::text("P1"), Cell::Number(2.0), Cell::text("2023-05-02")],
                vec![Cell::text("P2"), Cell::Number(4.0), Cell::Empty],
            ],
        );
        let records = extract_new_lesions(&table).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_num, 2);
        assert_eq!(records[0].evaluation_date, NaiveDate::from_ymd_opt(2023, 5, 1));
        assert_eq!(records[1].patient.as_str(), "P2");
        assert_eq!(records[1].evaluation_date, None);
    }
}
