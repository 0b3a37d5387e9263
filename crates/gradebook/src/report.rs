//! Text rendering of records, statistics, and the exported report.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::store::{RecordStore, Statistics};

const RULE: &str = "==============================================";
const TITLE: &str = "          Student Management Report";
const TABLE_HEADER: &str = "ID      Name                       Subjects  Average   Grade";
const TABLE_RULE: &str = "------  -------------------------  --------  --------  -----";

/// One fixed-width table row. Names longer than 25 characters are cut.
#[must_use]
pub fn render_row(record: &Record) -> String {
    format!(
        "{:<6}  {:<25.25}  {:<8}  {:<8.2}  {:<5}",
        record.id(),
        record.name(),
        record.subject_count(),
        record.average(),
        record.grade().as_char()
    )
    .trim_end()
    .to_string()
}

/// Table header, rule, and one row per record.
pub fn render_table<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    let mut out = format!("{TABLE_HEADER}\n{TABLE_RULE}\n");
    for record in records {
        out.push_str(&render_row(record));
        out.push('\n');
    }
    out
}

/// A one-row table followed by the individual scores.
#[must_use]
pub fn render_detail(record: &Record) -> String {
    let scores = record
        .scores()
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}Scores: {scores}\n", render_table([record]))
}

fn render_summary_lines(stats: &Statistics, out: &mut String) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "Total students : {}", stats.count);
    let _ = writeln!(out, "Class average  : {:.2}", stats.class_average);
    let _ = writeln!(
        out,
        "Topper         : ID {} ({}) Avg {:.2}",
        stats.top.id(),
        stats.top.name(),
        stats.top.average()
    );
    let _ = writeln!(
        out,
        "Lowest         : ID {} ({}) Avg {:.2}",
        stats.bottom.id(),
        stats.bottom.name(),
        stats.bottom.average()
    );
}

/// The statistics block, including the grade distribution.
#[must_use]
pub fn render_statistics(stats: &Statistics) -> String {
    use crate::record::Grade;

    let mut out = String::from("--- Statistics ---\n");
    render_summary_lines(stats, &mut out);
    let grades = Grade::ALL
        .iter()
        .map(|g| format!("{g}={}", stats.grade_counts.get(*g)))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "Grades         : {grades}");
    out
}

/// The full report: banner, table, and summary.
///
/// # Errors
///
/// Returns [`Error::EmptyStore`] if there is nothing to report.
pub fn render_report(store: &RecordStore) -> Result<String> {
    let stats = store.statistics()?;

    let mut out = format!("{RULE}\n{TITLE}\n{RULE}\n\n");
    out.push_str(&render_table(store.records()));
    out.push_str("\n--- Summary ---\n");
    render_summary_lines(&stats, &mut out);
    Ok(out)
}

/// Render the report and write it to `path`, replacing any previous report.
///
/// # Errors
///
/// Returns [`Error::EmptyStore`] for an empty store, or
/// [`Error::FileWrite`] if the file cannot be written.
pub fn export(path: &Path, store: &RecordStore) -> Result<()> {
    let report = render_report(store)?;
    fs::write(path, report).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), records = store.len(), "Exported report");
    Ok(())
}
