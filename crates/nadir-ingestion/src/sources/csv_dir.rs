//! Directory of csv exports, one file per sheet.

use std::path::{Path, PathBuf};

use tracing::instrument;

use nadir_common::error::{NadirError, Result};

use super::{split_header, SheetSource};
use crate::sheet::{Cell, Table};

#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }
}

impl SheetSource for CsvDirSource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn read_sheet(&self, sheet: &str, header_row: usize) -> Result<Table> {
        let path = self.sheet_path(sheet);
        if !path.exists() {
            return Err(NadirError::SheetMissing {
                source_name: self.describe(),
                sheet: sheet.to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let (headers, data) = split_header(rows, header_row, sheet, &self.describe(), |s| s.clone())?;
        let data = data
            .into_iter()
            .map(|r| r.iter().map(|s| Cell::text(s)).collect::<Vec<_>>())
            .filter(|r| !r.iter().all(Cell::is_empty))
            .collect();

        Ok(Table::new(sheet, headers, data))
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}
