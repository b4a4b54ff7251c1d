//! Reading real .xlsx workbooks through the calamine back-end.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use nadir_common::{NadirError, SheetSpec};
use nadir_ingestion::sources::{read_spec, SheetSource, WorkbookSource};

/// `Target Lesions`: title line in A1, header on row 1, two lesions below.
/// `Offset`: nothing in row 0 or column A, header at B2, a blank row between records.
fn write_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("tumor_assessment.xlsx");
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let visit_date = ExcelDateTime::from_ymd(2021, 1, 4).unwrap();

    let sheet = workbook.add_worksheet().set_name("Target Lesions").unwrap();
    sheet.write_string(0, 0, "Target Lesions export").unwrap();
    sheet.write_string(1, 0, "Patient").unwrap();
    sheet.write_string(1, 1, "Evaluation Date").unwrap();
    sheet.write_string(1, 2, "Longest Diameter (mm)").unwrap();
    sheet.write_string(2, 0, "0101-001").unwrap();
    sheet.write_datetime_with_format(2, 1, &visit_date, &date_format).unwrap();
    sheet.write_number(2, 2, 10.0).unwrap();
    sheet.write_string(3, 0, "0101-001").unwrap();
    sheet.write_datetime_with_format(3, 1, &visit_date, &date_format).unwrap();
    sheet.write_number(3, 2, 20.0).unwrap();

    let sheet = workbook.add_worksheet().set_name("Offset").unwrap();
    sheet.write_string(1, 1, "Patient").unwrap();
    sheet.write_string(2, 1, "0101-002").unwrap();
    sheet.write_string(4, 1, "0102-001").unwrap();

    workbook.save(&path).unwrap();
    path
}

#[test]
fn test_header_below_title_line() {
    let dir = tempfile::tempdir().unwrap();
    let source = WorkbookSource::new(write_workbook(dir.path()));

    let table = source.read_sheet("Target Lesions", 1).unwrap();
    assert_eq!(
        table.headers().to_vec(),
        vec!["patient", "evaluation_date", "longest_diameter_mm"]
    );
    assert_eq!(table.len(), 2);

    let [patient, date, diameter] = table
        .columns(["patient", "evaluation_date", "longest_diameter_mm"])
        .unwrap();
    let first = table.rows().next().unwrap();
    assert_eq!(first.patient(patient).map(|p| p.as_str().to_string()), Some("0101-001".to_string()));
    assert_eq!(first.get(date).as_date(), NaiveDate::from_ymd_opt(2021, 1, 4));
    assert_eq!(first.get(diameter).as_f64(), Some(10.0));
}

#[test]
fn test_sheet_starting_at_column_b() {
    let dir = tempfile::tempdir().unwrap();
    let source = WorkbookSource::new(write_workbook(dir.path()));

    let table = source.read_sheet("Offset", 1).unwrap();
    assert_eq!(table.headers().to_vec(), vec!["", "patient"]);
    assert_eq!(table.column("patient").unwrap(), 1);

    let patients: Vec<String> = table
        .rows()
        .filter_map(|r| r.patient(1))
        .map(|p| p.as_str().to_string())
        .collect();
    assert_eq!(patients, vec!["0101-002", "0102-001"]);
}

#[test]
fn test_read_spec_opens_workbook_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let table = read_spec(&SheetSpec::new(&path, "Target Lesions", 1)).unwrap();
    assert_eq!(table.len(), 2);

    let err = read_spec(&SheetSpec::new(&path, "New Lesions", 1)).unwrap_err();
    assert!(matches!(err, NadirError::SheetMissing { .. }));
}
