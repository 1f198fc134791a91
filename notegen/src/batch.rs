//! CSV batch driver
//!
//! Subjects come from the first column. Rows run one after another with
//! `delay_between_rows` between consecutive rows; a failing row is recorded
//! and the batch moves on.

use std::io::Read;
use std::path::PathBuf;

use notegen_common::Settings;
use serde::Serialize;
use tracing::{info, warn};

use crate::client::InferenceApi;
use crate::note::{write_note, StemAllocator};
use crate::pipeline::generate_note;
use crate::Result;

/// First-cell values treated as a header when they appear on the first data row
const HEADER_WORDS: [&str; 4] = ["subject", "subjects", "topic", "title"];

/// One subject read from the subject file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSubject {
    /// 1-based line in the source file
    pub line: u64,
    pub subject: String,
}

/// A row that did not produce a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub line: u64,
    pub subject: String,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub created: Vec<PathBuf>,
    pub failures: Vec<RowFailure>,
}

/// Read subjects from the first column of a CSV or plain-text list
///
/// Skips blank rows, rows whose first cell is blank or starts with `#`, a
/// leading header row, and rows that cannot be decoded.
pub fn read_subjects<R: Read>(reader: R) -> Result<Vec<CsvSubject>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut subjects = Vec::new();
    let mut seen_data_row = false;

    for record in csv_reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if is_row_error(&e) => {
                warn!("Skipping malformed row: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let first = record.get(0).unwrap_or("").trim();
        if first.is_empty() || first.starts_with('#') {
            continue;
        }

        let is_header = !seen_data_row && HEADER_WORDS.contains(&first.to_lowercase().as_str());
        seen_data_row = true;
        if is_header {
            continue;
        }

        subjects.push(CsvSubject {
            line,
            subject: first.to_string(),
        });
    }

    Ok(subjects)
}

fn is_row_error(error: &csv::Error) -> bool {
    matches!(
        error.kind(),
        csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. }
    )
}

/// Generate a note per subject, pausing between rows
///
/// No pause before the first row or after the last one. The pause applies
/// after failed rows too, since the API was still called.
pub async fn run_batch<A: InferenceApi>(
    api: &A,
    subjects: &[CsvSubject],
    settings: &Settings,
) -> BatchReport {
    let mut report = BatchReport::default();
    let mut stems = StemAllocator::new();
    let total = subjects.len();

    for (index, row) in subjects.iter().enumerate() {
        if index > 0 && !settings.between_rows().is_zero() {
            info!("Waiting {}s before next row", settings.delay_between_rows);
            tokio::time::sleep(settings.between_rows()).await;
        }

        info!(
            line = row.line,
            subject = %row.subject,
            "Processing row {}/{}",
            index + 1,
            total
        );

        let outcome = match generate_note(api, &row.subject, settings.meta_to_content()).await {
            Ok(note) => {
                let stem = stems.allocate(&note.subject);
                write_note(&settings.notes_dir, &stem, &note)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(path) => {
                info!(path = %path.display(), "Created note");
                report.created.push(path);
            }
            Err(e) => {
                warn!(line = row.line, subject = %row.subject, "Row failed: {}", e);
                report.failures.push(RowFailure {
                    line: row.line,
                    subject: row.subject.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        created = report.created.len(),
        failed = report.failures.len(),
        "Batch finished"
    );
    report
}
