//! Workbook sources.
//!
//! Two back-ends are provided:
//! - `WorkbookSource`: xlsx / xlsm / xls / ods workbooks read with calamine
//! - `CsvDirSource`: a directory of per-sheet csv exports (`<dir>/<sheet>.csv`)

pub mod xlsx;
pub mod csv_dir;

use std::path::Path;

use nadir_common::error::{NadirError, Result};
use nadir_common::SheetSpec;

use crate::sheet::Table;

pub use csv_dir::CsvDirSource;
pub use xlsx::WorkbookSource;

/// Common interface for all spreadsheet back-ends.
pub trait SheetSource {
    /// Read one sheet whose header sits on the 0-based absolute row `header_row`.
    /// Rows above the header are skipped; fully blank rows are dropped.
    fn read_sheet(&self, sheet: &str, header_row: usize) -> Result<Table>;

    /// Human-readable origin, used in logs and errors.
    fn describe(&self) -> String;
}

/// Pick a back-end for `path`: directories are csv exports, anything else a workbook.
pub fn open_source(path: &Path) -> Result<Box<dyn SheetSource>> {
    if path.is_dir() {
        return Ok(Box::new(CsvDirSource::new(path)));
    }
    if !path.exists() {
        return Err(NadirError::WorkbookUnreadable {
            path: path.display().to_string(),
            reason: "file not found".to_string(),
        });
    }
    Ok(Box::new(WorkbookSource::new(path)))
}

/// Read the sheet described by `spec`.
pub fn read_spec(spec: &SheetSpec) -> Result<Table> {
    let source = open_source(&spec.path)?;
    let table = source.read_sheet(&spec.sheet, spec.header_row)?;
    tracing::debug!(
        source = %source.describe(),
        sheet = %spec.sheet,
        rows = table.len(),
        "Sheet loaded"
    );
    Ok(table)
}

/// Split raw rows at the header offset into (headers, data rows).
pub(crate) fn split_header<T: Clone>(
    mut rows: Vec<Vec<T>>,
    header_idx: usize,
    sheet: &str,
    origin: &str,
    to_text: impl Fn(&T) -> String,
) -> Result<(Vec<String>, Vec<Vec<T>>)> {
    if header_idx >= rows.len() {
        return Err(NadirError::WorkbookUnreadable {
            path: origin.to_string(),
            reason: format!("sheet '{sheet}' has no header at row {header_idx}"),
        });
    }
    let data = rows.split_off(header_idx + 1);
    let headers = rows[header_idx].iter().map(to_text).collect();
    Ok((headers, data))
}
