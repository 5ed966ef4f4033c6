//! End-to-end tests for the report partitioner/exporter.
//!
//! These exercise the export stage against in-memory fetched tables; the
//! Snowflake session itself needs live credentials and is covered by the
//! core crate's unit tests at the protocol level.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use pulse_survey_core::{REPORT_COLUMNS, ResultTable, export_reports};

const EXPECTED_HEADER: &str = "EMP_NAME,PULSE_SURVEY_DATE,SUBMISSION_DATE,\
I_FEEL_EMPOWERED_AND_ACCOUNTABLE_TO_ACHIEVE_MY_DILIGENT_GOALS,\
HAVE_YOU_HAD_A_1_ON_1_WITH_YOUR_MANAGER_IN_THE_LAST_ONE_OR_TWO_WEEKS,\
PLEASE_SHARE_WHY_YOU_CHOSE_THIS_SCORE_THIS_WEEK";

/// Builds a fetched table with the manager column deliberately placed
/// before the report columns, plus an extra column the export must drop.
fn fetched_table(rows: &[(&str, &str)]) -> ResultTable {
    let mut columns = vec!["HIER_MANAGER_NAME".to_string(), "EMP_ID".to_string()];
    columns.extend(REPORT_COLUMNS.iter().map(ToString::to_string));

    let data = rows
        .iter()
        .map(|(manager, employee)| {
            vec![
                Some((*manager).to_string()),
                Some("E-1".to_string()),
                Some((*employee).to_string()),
                Some("2026-08-24".to_string()),
                Some("2026-08-25".to_string()),
                Some("4".to_string()),
                Some("Yes".to_string()),
                Some("Team velocity is good".to_string()),
            ]
        })
        .collect();

    ResultTable::new(columns, data)
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("report file should exist")
        .lines()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_one_file_per_manager_with_sanitized_names() {
    let dir = tempfile::tempdir().unwrap();
    let table = fetched_table(&[
        ("Jane O'Brien", "Ada"),
        ("Bob Smith", "Linus"),
        ("Jane O'Brien", "Barbara"),
    ]);

    let written = export_reports(&table, dir.path()).unwrap();
    assert_eq!(written.len(), 2);

    let bob = dir.path().join("pulse_survey_analysis_for_Bob_Smith.csv");
    let jane = dir.path().join("pulse_survey_analysis_for_Jane_O_Brien.csv");
    assert!(bob.is_file());
    assert!(jane.is_file());

    let jane_lines = read_lines(&jane);
    assert_eq!(jane_lines.len(), 3, "header plus two responses");
    assert_eq!(jane_lines[0], EXPECTED_HEADER);
    // original fetched row order preserved within the partition
    assert!(jane_lines[1].starts_with("Ada,"));
    assert!(jane_lines[2].starts_with("Barbara,"));

    let bob_lines = read_lines(&bob);
    assert_eq!(bob_lines.len(), 2);
    assert_eq!(bob_lines[0], EXPECTED_HEADER);
}

#[test]
fn test_header_is_fixed_regardless_of_fetched_column_order() {
    let dir = tempfile::tempdir().unwrap();
    let table = fetched_table(&[("Grace", "Ada")]);

    export_reports(&table, dir.path()).unwrap();
    let lines = read_lines(&dir.path().join("pulse_survey_analysis_for_Grace.csv"));
    assert_eq!(lines[0], EXPECTED_HEADER);
    // the EMP_ID column present in the fetch never reaches the report
    assert!(!lines[1].contains("E-1"));
}

#[test]
fn test_empty_table_creates_directory_and_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output");
    let table = ResultTable::default();

    let written = export_reports(&table, &out).unwrap();
    assert!(written.is_empty());
    assert!(out.is_dir());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[test]
fn test_re_export_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let table = fetched_table(&[("Grace", "Ada"), ("Grace", "Barbara")]);

    export_reports(&table, dir.path()).unwrap();
    let path = dir.path().join("pulse_survey_analysis_for_Grace.csv");
    let first = fs::read(&path).unwrap();

    export_reports(&table, dir.path()).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second, "overwrite, not append");
}

#[test]
fn test_colliding_sanitized_names_last_partition_wins() {
    let dir = tempfile::tempdir().unwrap();
    // "Team A" sorts before "Team/A" (space < slash), so "Team/A" is
    // processed last and owns the surviving file.
    let table = fetched_table(&[("Team A", "Ada"), ("Team/A", "Linus")]);

    let written = export_reports(&table, dir.path()).unwrap();

    let survivor = dir.path().join("pulse_survey_analysis_for_Team_A.csv");
    assert!(survivor.is_file());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    // returned paths match the files on disk, not the partitions processed
    assert_eq!(written, vec![survivor.clone()]);

    let lines = read_lines(&survivor);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("Linus,"));
}

#[test]
fn test_null_cells_export_as_empty_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut columns = vec!["HIER_MANAGER_NAME".to_string()];
    columns.extend(REPORT_COLUMNS.iter().map(ToString::to_string));
    let table = ResultTable::new(
        columns,
        vec![vec![
            Some("Grace".to_string()),
            Some("Ada".to_string()),
            Some("2026-08-24".to_string()),
            None,
            Some("4".to_string()),
            None,
            Some("fine".to_string()),
        ]],
    );

    export_reports(&table, dir.path()).unwrap();
    let lines = read_lines(&dir.path().join("pulse_survey_analysis_for_Grace.csv"));
    assert_eq!(lines[1], "Ada,2026-08-24,,4,,fine");
}
