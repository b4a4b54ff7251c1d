//! Shared fixtures: a small synthetic CRF export.
//!
//! The synthetic study is written as csv directories, one per workbook:
//!
//! ```text
//! <root>/medication_intake/Study Drug Administration.csv
//! <root>/screening/{Target Lesions,Non-Target Lesions}.csv
//! <root>/tumor_assessment/{Target Lesions,Non-Target Lesions,New Lesions,Overall Response}.csv
//! ```
//!
//! Every sheet carries a title line above the header (header row 1).
//!
//! | patient  | cohort | baseline          | follow-up SLD | notes                     |
//! |----------|--------|-------------------|---------------|---------------------------|
//! | 0101-001 | yes    | 10 + 20 = 30      | 24, 20, 28    | new lesion at visit 2     |
//! | 0101-002 | yes    | 40                | 26, 25        | partial response          |
//! | 0102-001 | yes    | non-measurable    | none          | Non-CR/Non-PD at visit 1  |
//! | 0103-004 | yes    | 25                | 30            | excluded by configuration |
//! | 0104-001 | no     | 15                | none          | not dosed                 |

use std::fs;
use std::io;
use std::path::Path;

use nadir_common::study_config::{InputsConfig, OutputConfig};
use nadir_common::{SheetSpec, StudyConfig};

pub const COHORT: &[&str] = &["0101-001", "0101-002", "0102-001", "0103-004"];
pub const EXCLUDED: &str = "0103-004";
pub const DERIVED_ROWS: usize = 9;

fn write_sheet(dir: &Path, sheet: &str, headers: &[&str], rows: &[&[&str]]) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(dir.join(format!("{sheet}.csv")))?;
    writer.write_record([format!("{sheet} export")])?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(*row)?;
    }
    writer.flush()
}

/// Write the synthetic study under `root` and return inputs pointing at it.
pub fn write_csv_study(root: &Path) -> io::Result<InputsConfig> {
    let medication = root.join("medication_intake");
    let screening = root.join("screening");
    let assessment = root.join("tumor_assessment");

    write_sheet(
        &medication,
        "Study Drug Administration",
        &["Patient", "Event Num", "Dose Taken"],
        &[
            &["0101-001", "1", "Yes"],
            &["0101-001", "2", "Yes"],
            &["0101-002", "1", "Yes"],
            &["0102-001", "1", "yes"],
            &["0103-004", "1", "Yes"],
            &["0104-001", "1", "No"],
        ],
    )?;

    write_sheet(
        &screening,
        "Target Lesions",
        &["Patient", "Evaluation Date", "Longest Diameter"],
        &[
            &["0101-001", "2021-01-04", "10"],
            &["0101-001", "2021-01-04", "20"],
            &["0101-002", "2021-01-06", "40"],
            &["0103-004", "2021-01-07", "25"],
            &["0104-001", "2021-01-08", "15"],
        ],
    )?;
    write_sheet(
        &screening,
        "Non-Target Lesions",
        &["Patient", "Evaluation Date", "Non-Target Lesion Present"],
        &[
            &["0101-001", "2021-01-04", "Yes"],
            &["0102-001", "2021-01-05", "Yes"],
        ],
    )?;

    write_sheet(
        &assessment,
        "Target Lesions",
        &["Patient", "Event Num", "Evaluation Date", "Longest Diameter"],
        &[
            &["0101-001", "1", "2021-02-01", "14"],
            &["0101-001", "1", "2021-02-01", "10"],
            &["0101-001", "2", "2021-03-01", "20"],
            &["0101-001", "3", "2021-04-01", "28"],
            &["0101-002", "1", "2021-02-03", "26"],
            &["0101-002", "2", "2021-03-03", "25"],
            &["0103-004", "1", "2021-02-04", "30"],
        ],
    )?;
    write_sheet(
        &assessment,
        "Non-Target Lesions",
        &["Patient", "Event Num", "Evaluation Date", "Non-Target Lesion Present"],
        &[
            &["0101-001", "1", "2021-02-01", "Yes"],
            &["0101-001", "2", "2021-03-01", "Yes"],
            &["0101-001", "3", "2021-04-01", "Yes"],
            &["0102-001", "1", "2021-02-02", "Yes"],
        ],
    )?;
    write_sheet(
        &assessment,
        "New Lesions",
        &["Patient", "Event Num", "Evaluation Date"],
        &[
            &["0101-001", "3", "2021-04-01"],
            &["0101-001", "2", "2021-03-01"],
        ],
    )?;
    write_sheet(
        &assessment,
        "Overall Response",
        &["Patient", "Event Num", "Target Response", "Non-Target Response", "Overall Response"],
        &[
            &["0101-001", "1", "SD", "Non-CR/Non-PD", "Stable Disease (SD)"],
            &["0101-001", "2", "SD", "Non-CR/Non-PD", "Progressive Disease (PD)"],
            &["0101-001", "3", "PD", "Non-CR/Non-PD", "Progressive Disease (PD)"],
            &["0101-002", "1", "PR", "", "Partial Response (PR)"],
            &["0101-002", "2", "PR", "", "Partial Response (PR)"],
            &["0102-001", "1", "", "Non-CR/Non-PD", "Non-CR/Non-PD"],
            &["0103-004", "1", "SD", "", "Stable Disease (SD)"],
        ],
    )?;

    Ok(InputsConfig {
        medication: SheetSpec::new(&medication, "Study Drug Administration", 1),
        screening_target: SheetSpec::new(&screening, "Target Lesions", 1),
        screening_nontarget: SheetSpec::new(&screening, "Non-Target Lesions", 1),
        followup_target: SheetSpec::new(&assessment, "Target Lesions", 1),
        followup_nontarget: SheetSpec::new(&assessment, "Non-Target Lesions", 1),
        new_lesions: SheetSpec::new(&assessment, "New Lesions", 1),
        overall_response: SheetSpec::new(&assessment, "Overall Response", 1),
    })
}

/// Full configuration for the synthetic study, writing outputs to `<root>/output`.
pub fn csv_study_config(root: &Path) -> io::Result<StudyConfig> {
    Ok(StudyConfig {
        inputs: write_csv_study(root)?,
        output: OutputConfig {
            dir: root.join("output"),
            write_csv: true,
            ..Default::default()
        },
        ..Default::default()
    })
}
