//! In-memory sheet representation shared by every workbook source.
//!
//! A `Table` keeps canonical (snake_case) header names and typed cells.
//! Extractors address columns by canonical name only, so every source must
//! pass its raw headers through [`normalise_header`].

use chrono::{Duration, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use nadir_common::error::{NadirError, Result};
use nadir_common::PatientId;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Text date layouts seen in CRF exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%b-%Y", "%d%b%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Canonical lowercase snake_case form of a header.
///
/// `"Evaluation Date"` → `evaluation_date`, `"Non-Target Lesion Present?"` →
/// `non_target_lesion_present`.
pub fn normalise_header(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    NON_ALNUM.replace_all(&lower, "_").trim_matches('_').to_string()
}

/// Excel serial day number → calendar date (1900 date system).
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

// ── Cell ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    /// Build from raw text, mapping blank strings to `Empty`.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Integer value; fractional numbers are rejected.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Number(n) => excel_serial_to_date(*n),
            Cell::Text(s) => parse_date_text(s),
            _ => None,
        }
    }

    /// Yes/no flag. Unrecognised text is `None`.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Number(n) if *n == 1.0 => Some(true),
            Cell::Number(n) if *n == 0.0 => Some(false),
            Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" | "1" => Some(true),
                "no" | "n" | "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// One sheet with canonical headers.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Headers are normalised here; callers may pass raw header text.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers.iter().map(|h| normalise_header(h)).collect();
        Self { name: name.into(), headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a canonical column. Missing columns are fatal.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| NadirError::ColumnMissing {
                sheet: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Resolve several columns at once, failing on the first missing one.
    pub fn columns<const N: usize>(&self, names: [&str; N]) -> Result<[usize; N]> {
        let mut out = [0usize; N];
        for (slot, name) in out.iter_mut().zip(names) {
            *slot = self.column(name)?;
        }
        Ok(out)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { cells })
    }
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    cells: &'a [Cell],
}

static EMPTY: Cell = Cell::Empty;

impl<'a> Row<'a> {
    /// Short rows read as `Empty` past their end.
    pub fn get(&self, idx: usize) -> &'a Cell {
        self.cells.get(idx).unwrap_or(&EMPTY)
    }

    pub fn patient(&self, idx: usize) -> Option<PatientId> {
        self.get(idx).as_text().and_then(|s| PatientId::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_header() {
        assert_eq!(normalise_header("Evaluation Date"), "evaluation_date");
        assert_eq!(normalise_header("  Non-Target Lesion Present? "), "non_target_lesion_present");
        assert_eq!(normalise_header("EVENT_NUM"), "event_num");
        assert_eq!(normalise_header("Longest Diameter (mm)"), "longest_diameter_mm");
    }

    #[test]
    fn test_date_coercions() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        assert_eq!(Cell::text("2023-01-02").as_date(), Some(expected));
        assert_eq!(Cell::text("02/01/2023").as_date(), Some(expected));
        assert_eq!(Cell::text("02JAN2023").as_date(), Some(expected));
        assert_eq!(Cell::text("02-Jan-2023").as_date(), Some(expected));
        assert_eq!(Cell::text("2023-01-02 00:00:00").as_date(), Some(expected));
        assert_eq!(Cell::Number(44928.0).as_date(), Some(expected));
        assert_eq!(Cell::text("not a date").as_date(), None);
        assert_eq!(Cell::Empty.as_date(), None);
    }

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(Cell::text(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(Cell::Number(3.0).as_u32(), Some(3));
        assert_eq!(Cell::text("2").as_u32(), Some(2));
        assert_eq!(Cell::Number(2.5).as_u32(), None);
        assert_eq!(Cell::text("NA").as_f64(), None);
    }

    #[test]
    fn test_flags() {
        assert_eq!(Cell::text("Yes").as_flag(), Some(true));
        assert_eq!(Cell::text("no").as_flag(), Some(false));
        assert_eq!(Cell::Bool(true).as_flag(), Some(true));
        assert_eq!(Cell::text("Unknown").as_flag(), None);
    }

    #[test]
    fn test_missing_column_is_error() {
        let t = Table::new("EX", vec!["Patient".into()], vec![]);
        assert_eq!(t.column("patient").unwrap(), 0);
        match t.column("event_num") {
            Err(NadirError::ColumnMissing { sheet, column }) => {
                assert_eq!(sheet, "EX");
                assert_eq!(column, "event_num");
            }
            other => panic!("expected ColumnMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_short_rows_read_empty() {
        let t = Table::new(
            "T",
            vec!["a".into(), "b".into()],
            vec![vec![Cell::text("x")]],
        );
        let row = t.rows().next().unwrap();
        assert_eq!(row.get(1), &Cell::Empty);
    }
}
