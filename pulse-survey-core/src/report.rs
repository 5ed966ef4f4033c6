//! Per-manager report partitioning and CSV export.
//!
//! Partitions the fetched table by the literal `HIER_MANAGER_NAME` value
//! and writes one CSV per partition into the output directory. Partition
//! processing order is the ascending order of manager names, so runs over
//! the same table are deterministic. Files are overwritten on re-export.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::{PulseSurveyError, Result};
use crate::table::ResultTable;

/// Column carrying the partition key.
pub const MANAGER_NAME_COLUMN: &str = "HIER_MANAGER_NAME";

/// The six output columns, in the fixed order every report file uses.
/// Extra columns in the fetched table are dropped silently.
pub const REPORT_COLUMNS: [&str; 6] = [
    "EMP_NAME",
    "PULSE_SURVEY_DATE",
    "SUBMISSION_DATE",
    "I_FEEL_EMPOWERED_AND_ACCOUNTABLE_TO_ACHIEVE_MY_DILIGENT_GOALS",
    "HAVE_YOU_HAD_A_1_ON_1_WITH_YOUR_MANAGER_IN_THE_LAST_ONE_OR_TWO_WEEKS",
    "PLEASE_SHARE_WHY_YOU_CHOSE_THIS_SCORE_THIS_WEEK",
];

#[allow(clippy::expect_used)]
static NON_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w-]").expect("static character-class pattern is valid")
});

/// Replaces every character that is not a word character or hyphen with an
/// underscore.
///
/// This mapping is not injective: `Team A` and `Team/A` both sanitize to
/// `Team_A`. [`export_reports`] detects and warns about such collisions.
pub fn sanitize_manager_name(name: &str) -> String {
    NON_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

/// Report filename for a manager, relative to the output directory.
pub fn report_filename(manager_name: &str) -> String {
    format!(
        "pulse_survey_analysis_for_{}.csv",
        sanitize_manager_name(manager_name)
    )
}

/// Groups row indices by manager name, ascending by key.
///
/// Rows with a null or empty manager name are skipped, matching the
/// original grouping behavior; the caller is told how many were dropped.
fn partition_by_manager(table: &ResultTable) -> Result<(BTreeMap<String, Vec<usize>>, usize)> {
    if table.is_empty() {
        return Ok((BTreeMap::new(), 0));
    }
    // An empty table reports no columns at all; a populated one must carry
    // the partition key.
    if table.column_index(MANAGER_NAME_COLUMN).is_none() {
        return Err(PulseSurveyError::configuration(format!(
            "fetched table has no {MANAGER_NAME_COLUMN} column"
        )));
    }

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in 0..table.len() {
        match table.value(row, MANAGER_NAME_COLUMN) {
            Some(name) if !name.is_empty() => {
                groups.entry(name.to_string()).or_default().push(row);
            }
            _ => skipped += 1,
        }
    }
    Ok((groups, skipped))
}

/// Writes one CSV report per distinct manager name into `output_dir`.
///
/// The directory is created if absent. Each file has exactly the
/// [`REPORT_COLUMNS`] header and one record per survey response, preserving
/// the fetched row order within the partition. Returns the distinct file
/// paths written, in processing order: colliding partitions overwrite one
/// file, so the returned count equals the files on disk.
///
/// Sanitized-filename collisions are detected up front and surfaced as a
/// warning naming every manager involved; the last partition processed
/// still wins the file, preserving the documented overwrite behavior.
///
/// # Errors
/// Returns `Io`/`Csv` on the first directory or file failure. Files written
/// for earlier partitions remain on disk; there is no rollback.
pub fn export_reports(table: &ResultTable, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| {
        PulseSurveyError::io(
            format!("failed to create output directory {}", output_dir.display()),
            e,
        )
    })?;

    let (groups, skipped) = partition_by_manager(table)?;
    if skipped > 0 {
        warn!(
            "skipped {skipped} row(s) with no manager name; no report file covers them"
        );
    }

    for (filename, managers) in detect_filename_collisions(&groups) {
        warn!(
            "manager names {managers:?} all sanitize to {filename}; the last one processed \
             overwrites the others"
        );
    }

    let column_positions = report_column_positions(table, &groups)?;

    let mut written: Vec<PathBuf> = Vec::with_capacity(groups.len());
    for (manager_name, rows) in &groups {
        let path = output_dir.join(report_filename(manager_name));
        write_partition(table, &column_positions, rows, &path)?;
        info!("wrote {} ({} response(s))", path.display(), rows.len());
        if !written.contains(&path) {
            written.push(path);
        }
    }

    Ok(written)
}

/// Resolves [`REPORT_COLUMNS`] to positions in the fetched table. Only
/// needed when there is something to write.
fn report_column_positions(
    table: &ResultTable,
    groups: &BTreeMap<String, Vec<usize>>,
) -> Result<Vec<usize>> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    REPORT_COLUMNS
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| {
                PulseSurveyError::configuration(format!("fetched table has no {name} column"))
            })
        })
        .collect()
}

/// Maps each report filename claimed by more than one manager to the
/// manager names colliding on it, ascending by filename. Empty when the
/// sanitization happens to be injective over the observed names.
fn detect_filename_collisions(
    groups: &BTreeMap<String, Vec<usize>>,
) -> BTreeMap<String, Vec<String>> {
    let mut by_filename: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for manager_name in groups.keys() {
        by_filename
            .entry(report_filename(manager_name))
            .or_default()
            .push(manager_name.clone());
    }
    by_filename.retain(|_, managers| managers.len() > 1);
    by_filename
}

fn write_partition(
    table: &ResultTable,
    column_positions: &[usize],
    rows: &[usize],
    path: &Path,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        PulseSurveyError::csv(format!("failed to open {} for writing", path.display()), e)
    })?;

    writer
        .write_record(REPORT_COLUMNS)
        .map_err(|e| PulseSurveyError::csv(format!("failed writing header to {}", path.display()), e))?;

    for &row in rows {
        let record = column_positions
            .iter()
            .map(|&col| table.value_at(row, col).unwrap_or_default());
        writer.write_record(record).map_err(|e| {
            PulseSurveyError::csv(format!("failed writing record to {}", path.display()), e)
        })?;
    }

    writer
        .flush()
        .map_err(|e| PulseSurveyError::io(format!("failed flushing {}", path.display()), e))
}
