//! Workbook back-end built on calamine.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::instrument;

use nadir_common::error::{NadirError, Result};

use super::{split_header, SheetSource};
use crate::sheet::{excel_serial_to_date, Cell, Table};

/// Excel / OpenDocument workbook on disk.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn unreadable(&self, reason: impl ToString) -> NadirError {
        NadirError::WorkbookUnreadable {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl SheetSource for WorkbookSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn read_sheet(&self, sheet: &str, header_row: usize) -> Result<Table> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| self.unreadable(e))?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(NadirError::SheetMissing {
                source_name: self.describe(),
                sheet: sheet.to_string(),
            });
        }

        let range = workbook.worksheet_range(sheet).map_err(|e| self.unreadable(e))?;

        // calamine ranges start at the first used cell, not at A1.
        let (first_row, first_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let header_idx = header_row.saturating_sub(first_row);

        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|r| {
                let mut cells = vec![Cell::Empty; first_col];
                cells.extend(r.iter().map(cell_from_data));
                cells
            })
            .collect();

        let (headers, data) = split_header(rows, header_idx, sheet, &self.describe(), |c| {
            c.as_text().unwrap_or_default()
        })?;
        let data = data
            .into_iter()
            .filter(|r| !r.iter().all(Cell::is_empty))
            .collect();

        Ok(Table::new(sheet, headers, data))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => Cell::text(s),
        Data::DurationIso(s) => Cell::text(s),
        Data::Error(_) => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::String("  Yes ".into())), Cell::Text("Yes".into()));
        assert_eq!(cell_from_data(&Data::String("   ".into())), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(
            cell_from_data(&Data::DateTimeIso("2023-01-02".into())).as_date(),
            NaiveDate::from_ymd_opt(2023, 1, 2)
        );
    }

    #[test]
    fn test_missing_workbook_is_unreadable() {
        let source = WorkbookSource::new("/nonexistent/screening.xlsx");
        assert!(matches!(
            source.read_sheet("Target Lesions", 0),
            Err(NadirError::WorkbookUnreadable { .. })
        ));
    }
}
