//! Post-baseline tumour assessments.
//!
//! Target diameters are summed per (patient, visit); non-target rows collapse
//! to a presence flag per visit. The two sides are full-outer-joined on
//! (patient, visit, date) so visits present in only one sheet survive.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use nadir_common::error::Result;
use nadir_common::PatientId;

use crate::models::{columns, FollowUpRecord};
use crate::sheet::Table;

type VisitKey = (PatientId, u32);
type JoinKey = (PatientId, u32, Option<NaiveDate>);

fn target_sums(table: &Table) -> Result<BTreeMap<VisitKey, (Option<f64>, Option<NaiveDate>)>> {
    let [patient_col, event_col, date_col, diameter_col] = table.columns([
        columns::PATIENT,
        columns::EVENT_NUM,
        columns::EVALUATION_DATE,
        columns::LONGEST_DIAMETER,
    ])?;

    let mut out: BTreeMap<VisitKey, (Option<f64>, Option<NaiveDate>)> = BTreeMap::new();
    for row in table.rows() {
        let (Some(patient), Some(event)) = (row.patient(patient_col), row.get(event_col).as_u32())
        else {
            continue;
        };
        let (sum, date) = out.entry((patient, event)).or_default();
        if let Some(d) = row.get(diameter_col).as_f64() {
            *sum = Some(sum.unwrap_or(0.0) + d);
        }
        if date.is_none() {
            *date = row.get(date_col).as_date();
        }
    }
    Ok(out)
}

fn nontarget_visits(table: &Table) -> Result<BTreeMap<VisitKey, (Option<bool>, Option<NaiveDate>)>> {
    let [patient_col, event_col, date_col, present_col] = table.columns([
        columns::PATIENT,
        columns::EVENT_NUM,
        columns::EVALUATION_DATE,
        columns::NONTARGET_PRESENT,
    ])?;

    let mut out: BTreeMap<VisitKey, (Option<bool>, Option<NaiveDate>)> = BTreeMap::new();
    for row in table.rows() {
        let (Some(patient), Some(event)) = (row.patient(patient_col), row.get(event_col).as_u32())
        else {
            continue;
        };
        let (present, date) = out.entry((patient, event)).or_default();
        match (*present, row.get(present_col).as_flag()) {
            (_, Some(true)) => *present = Some(true),
            (None, flag) => *present = flag,
            _ => {}
        }
        if date.is_none() {
            *date = row.get(date_col).as_date();
        }
    }
    Ok(out)
}

/// Join target sums and non-target presence per visit.
pub fn extract_followup(target: &Table, nontarget: &Table) -> Result<Vec<FollowUpRecord>> {
    let sums = target_sums(target)?;
    let nontarget = nontarget_visits(nontarget)?;
    debug!(target_visits = sums.len(), nontarget_visits = nontarget.len(), "Follow-up sheets collapsed");

    let mut joined: BTreeMap<JoinKey, FollowUpRecord> = BTreeMap::new();
    for ((patient, event), (sum, date)) in sums {
        joined.insert(
            (patient.clone(), event, date),
            FollowUpRecord {
                patient,
                event_num: event,
                evaluation_date: date,
                sum_of_lesions: sum,
                nontarget_present: None,
            },
        );
    }
    for ((patient, event), (present, date)) in nontarget {
        joined
            .entry((patient.clone(), event, date))
            .or_insert_with(|| FollowUpRecord {
                patient,
                event_num: event,
                evaluation_date: date,
                sum_of_lesions: None,
                nontarget_present: None,
            })
            .nontarget_present = present;
    }

    let records: Vec<FollowUpRecord> = joined.into_values().collect();
    info!(visits = records.len(), "Follow-up assessments extracted");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn sheet(name: &str, last: &str, rows: &[(&str, f64, &str, Cell)]) -> Table {
        Table::new(
            name,
            vec!["Patient".into(), "Event Num".into(), "Evaluation Date".into(), last.into()],
            rows.iter()
                .map(|(p, e, d, c)| vec![Cell::text(p), Cell::Number(*e), Cell::text(d), c.clone()])
                .collect(),
        )
    }

    #[test]
    fn test_sums_per_visit_and_outer_join() {
        let target = sheet(
            "Target Lesions",
            "Longest Diameter",
            &[
                ("P1", 1.0, "2023-03-01", Cell::Number(12.0)),
                ("P1", 1.0, "2023-03-01", Cell::Number(12.0)),
                ("P1", 2.0, "2023-05-01", Cell::Number(20.0)),
            ],
        );
        let nontarget = sheet(
            "Non-Target Lesions",
            "Non-Target Lesion Present",
            &[
                ("P1", 1.0, "2023-03-01", Cell::text("Yes")),
                ("P1", 3.0, "2023-07-01", Cell::text("No")),
            ],
        );

        let records = extract_followup(&target, &nontarget).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].event_num, 1);
        assert_eq!(records[0].sum_of_lesions, Some(24.0));
        assert_eq!(records[0].nontarget_present, Some(true));

        assert_eq!(records[1].event_num, 2);
        assert_eq!(records[1].nontarget_present, None);

        assert_eq!(records[2].event_num, 3);
        assert_eq!(records[2].sum_of_lesions, None);
        assert_eq!(records[2].nontarget_present, Some(false));
    }

    #[test]
    fn test_date_mismatch_keeps_both_rows() {
        let target = sheet(
            "Target Lesions",
            "Longest Diameter",
            &[("P1", 1.0, "2023-03-01", Cell::Number(12.0))],
        );
        let nontarget = sheet(
            "Non-Target Lesions",
            "Non-Target Lesion Present",
            &[("P1", 1.0, "2023-03-02", Cell::text("Yes"))],
        );
        let records = extract_followup(&target, &nontarget).unwrap();
        assert_eq!(records.len(), 2);
    }
}
