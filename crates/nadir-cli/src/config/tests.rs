use std::fs;

use super::*;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_from(&dir.path().join("nadir.toml")).unwrap();
    assert!(loaded.source.is_none());
    assert_eq!(loaded.config.exclusions.patients, vec!["0103-004".to_string()]);
    assert_eq!(loaded.config.output.table_name, "recist_derived");
}

#[test]
fn test_relative_paths_resolve_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nadir.toml");
    fs::write(
        &path,
        r#"
[inputs.medication]
path = "crf/medication_intake.xlsx"
sheet = "EX"
header_row = 0

[output]
dir = "derived"
"#,
    )
    .unwrap();

    let loaded = load_from(&path).unwrap();
    let config = loaded.config;
    assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    assert_eq!(config.inputs.medication.path, dir.path().join("crf/medication_intake.xlsx"));
    assert_eq!(config.inputs.medication.sheet, "EX");
    assert_eq!(config.inputs.medication.header_row, 0);
    // Untouched sheets keep their defaults, resolved the same way.
    assert_eq!(config.inputs.new_lesions.path, dir.path().join("data/tumor_assessment.xlsx"));
    assert_eq!(config.output.dir, dir.path().join("derived"));
}

#[test]
fn test_yaml_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.yaml");
    fs::write(&path, "exclusions:\n  patients: []\nthresholds:\n  response_pct: -25.0\n").unwrap();

    let config = load_from(&path).unwrap().config;
    assert!(config.exclusions.patients.is_empty());
    assert_eq!(config.thresholds.response_pct, -25.0);
    assert_eq!(config.thresholds.progression_pct, 20.0);
}

#[test]
fn test_invalid_site_pattern_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nadir.toml");
    fs::write(&path, "[site]\npattern = \"^\\\\d{4}$\"\n").unwrap();
    assert!(load_from(&path).is_err());
}
