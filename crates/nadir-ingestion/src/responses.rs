//! Investigator-recorded responses, projected verbatim.

use tracing::info;

use nadir_common::error::Result;

use crate::models::{columns, ResponseRecord};
use crate::sheet::Table;

pub fn extract_responses(table: &Table) -> Result<Vec<ResponseRecord>> {
    let [patient_col, event_col, target_col, nontarget_col, overall_col] = table.columns([
        columns::PATIENT,
        columns::EVENT_NUM,
        columns::TARGET_RESPONSE,
        columns::NONTARGET_RESPONSE,
        columns::OVERALL_RESPONSE,
    ])?;

    let records: Vec<ResponseRecord> = table
        .rows()
        .filter_map(|row| {
            Some(ResponseRecord {
                patient: row.patient(patient_col)?,
                event_num: row.get(event_col).as_u32()?,
                target_response: row.get(target_col).as_text(),
                nontarget_response: row.get(nontarget_col).as_text(),
                overall_response: row.get(overall_col).as_text(),
            })
        })
        .collect();

    info!(records = records.len(), "Overall responses extracted");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    #[test]
    fn test_verbatim_projection() {
        let table = Table::new(
            "Overall Response",
            vec![
                "Patient".into(),
                "Event Num".into(),
                "Target Response".into(),
                "Non-Target Response".into(),
                "Overall Response".into(),
                "Comment".into(),
            ],
            vec![vec![
                Cell::text("0101-001"),
                Cell::Number(1.0),
                Cell::text("Partial Response (PR)"),
                Cell::Empty,
                Cell::text("Partial Response (PR)"),
                Cell::text("ignored"),
            ]],
        );
        let records = extract_responses(&table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].overall_response.as_deref(), Some("Partial Response (PR)"));
        assert_eq!(records[0].nontarget_response, None);
    }
}
