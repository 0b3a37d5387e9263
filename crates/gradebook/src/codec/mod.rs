//! Flat-file codec for gradebook.
//!
//! Translates between a [`RecordStore`] and its delimited text form. Writing
//! always replaces the whole file. Reading is forgiving: a line that fails
//! validation is logged and skipped, and loading carries on with the next
//! one.

pub mod format;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::record::{sanitize_name, validate_scores, Grade, Record};
use crate::store::RecordStore;

use format::{AVERAGE_PRECISION, FIELD_COUNT, FIELD_DELIMITER, HEADER, SCORE_DELIMITER};

/// Why a single line was rejected during decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLine {
    /// Fewer than six fields.
    #[error("expected {} fields, found {found}", FIELD_COUNT)]
    TooFewFields {
        /// Number of fields present.
        found: usize,
    },

    /// A numeric field did not parse.
    #[error("{field} is not a valid number: {value:?}")]
    InvalidNumber {
        /// Name of the field.
        field: &'static str,
        /// The raw field text.
        value: String,
    },

    /// Id zero is never assigned.
    #[error("id must be positive")]
    ZeroId,

    /// The id was already used by an earlier line.
    #[error("duplicate id {0}")]
    DuplicateId(u32),

    /// The declared subject count is outside the allowed range.
    #[error("subject count {found} is outside 1-{max}")]
    SubjectCount {
        /// Declared count.
        found: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The number of listed scores differs from the declared count.
    #[error("declared {declared} scores but listed {listed}")]
    ScoreCountMismatch {
        /// Declared count.
        declared: usize,
        /// Scores actually listed.
        listed: usize,
    },

    /// The grade field is empty.
    #[error("missing grade")]
    MissingGrade,

    /// The name or scores violate a record constraint.
    #[error("{0}")]
    Invalid(String),
}

/// Result of decoding a data file.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// The records that were accepted, in file order.
    pub store: RecordStore,
    /// Number of lines skipped as malformed.
    pub skipped: usize,
    /// Whether loading stopped early because the store was full.
    pub truncated: bool,
}

/// Serialize a single record as one line, without the line terminator.
#[must_use]
pub fn encode_record(record: &Record) -> String {
    let scores = record
        .scores()
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(&SCORE_DELIMITER.to_string());

    format!(
        "{id}{d}{name}{d}{count}{d}{scores}{d}{average:.prec$}{d}{grade}",
        id = record.id(),
        name = record.name(),
        count = record.subject_count(),
        average = record.average(),
        grade = record.grade(),
        prec = AVERAGE_PRECISION,
        d = FIELD_DELIMITER,
    )
}

/// Serialize the header and every record, in order.
#[must_use]
pub fn encode(records: &[Record]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + records.len() * 48);
    out.push_str(HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&encode_record(record));
        out.push('\n');
    }
    out
}

/// Parse one record line.
///
/// The persisted average and grade are informational: both are recomputed
/// from the scores, and a disagreement is only logged.
///
/// # Errors
///
/// Returns the reason the line cannot become a record.
pub fn decode_record(line: &str, limits: &Limits) -> std::result::Result<Record, MalformedLine> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() < FIELD_COUNT {
        return Err(MalformedLine::TooFewFields {
            found: fields.len(),
        });
    }

    let id: u32 = parse_number("id", fields[0])?;
    if id == 0 {
        return Err(MalformedLine::ZeroId);
    }

    let name = fit_name(fields[1], limits)?;

    let declared: usize = parse_number("subject count", fields[2])?;
    if declared == 0 || declared > limits.max_subjects {
        return Err(MalformedLine::SubjectCount {
            found: declared,
            max: limits.max_subjects,
        });
    }

    let scores = fields[3]
        .split(SCORE_DELIMITER)
        .map(|s| parse_number::<u8>("score", s))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if scores.len() != declared {
        return Err(MalformedLine::ScoreCountMismatch {
            declared,
            listed: scores.len(),
        });
    }
    validate_scores(&scores, limits).map_err(|e| MalformedLine::Invalid(e.to_string()))?;

    let persisted_average: f64 = parse_number("average", fields[4])?;
    let persisted_grade = fields[5].trim().chars().next().ok_or(MalformedLine::MissingGrade)?;

    let record = Record::new(id, name, scores);

    if (persisted_average - record.average()).abs() >= 0.005
        || Grade::from_char(persisted_grade) != Some(record.grade())
    {
        debug!(
            id,
            persisted_average,
            %persisted_grade,
            average = record.average(),
            grade = %record.grade(),
            "Persisted summary disagrees with scores; using recomputed values"
        );
    }

    Ok(record)
}

/// Clean a persisted name and cut it to the configured length.
///
/// An over-long name is shortened rather than rejected, so a lowered
/// `max_name_length` never drops an existing record.
fn fit_name(raw: &str, limits: &Limits) -> std::result::Result<String, MalformedLine> {
    let sanitized = sanitize_name(raw);
    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        return Err(MalformedLine::Invalid("name cannot be empty".to_string()));
    }

    if trimmed.chars().count() <= limits.max_name_length {
        return Ok(trimmed.to_string());
    }
    let cut: String = trimmed.chars().take(limits.max_name_length).collect();
    debug!(
        name = trimmed,
        max = limits.max_name_length,
        "Shortened over-long name"
    );
    Ok(cut.trim_end().to_string())
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    raw: &str,
) -> std::result::Result<T, MalformedLine> {
    raw.trim()
        .parse()
        .map_err(|_| MalformedLine::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Parse the full text of a data file.
///
/// A first line that is not a header is treated as data. Malformed lines and
/// lines repeating an earlier id are skipped. Decoding stops once the store
/// reaches `limits.max_records`.
#[must_use]
pub fn decode(text: &str, limits: &Limits) -> Decoded {
    let mut records: Vec<Record> = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0;
    let mut truncated = false;

    // Editors on some platforms prepend a byte order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if index == 0 && format::is_header(line) {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if records.len() >= limits.max_records {
            truncated = true;
            break;
        }

        let decoded = decode_record(line, limits).and_then(|record| {
            if seen.insert(record.id()) {
                Ok(record)
            } else {
                Err(MalformedLine::DuplicateId(record.id()))
            }
        });

        match decoded {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!(line = index + 1, %reason, "Skipping malformed record");
                skipped += 1;
            }
        }
    }

    if truncated {
        warn!(
            max_records = limits.max_records,
            "Record capacity reached; remaining lines ignored"
        );
    }

    Decoded {
        store: RecordStore::from_records(records, *limits),
        skipped,
        truncated,
    }
}

/// Write every record to `path`, replacing its contents.
///
/// Parent directories are created if needed. The file is truncated and
/// rewritten in place.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn write_file(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let write_err = |source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(encode(records).as_bytes()).map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    debug!(path = %path.display(), records = records.len(), "Saved records");
    Ok(())
}

/// Read and decode the data file at `path`.
///
/// A missing file yields an empty store. Bytes that are not valid UTF-8 are
/// replaced rather than rejected, so one bad line cannot hide the rest.
///
/// # Errors
///
/// Returns [`Error::FileRead`] if the file exists but cannot be read.
pub fn read_file(path: &Path, limits: &Limits) -> Result<Decoded> {
    if !path.exists() {
        info!(path = %path.display(), "No data file yet; starting empty");
        return Ok(Decoded {
            store: RecordStore::new(*limits),
            skipped: 0,
            truncated: false,
        });
    }

    let bytes = fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode(&String::from_utf8_lossy(&bytes), limits);

    debug!(
        path = %path.display(),
        records = decoded.store.len(),
        skipped = decoded.skipped,
        "Loaded records"
    );
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::default()
    }

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new(limits());
        store.add("Alice Johnson", vec![85, 90, 78]).unwrap();
        store.add("Bob", vec![40, 55]).unwrap();
        store.add("Smith, John", vec![100]).unwrap();
        store
    }

    #[test]
    fn test_encode_record() {
        let record = Record::new(1, "Alice Johnson".to_string(), vec![85, 90, 78]);
        assert_eq!(encode_record(&record), "1,Alice Johnson,3,85;90;78,84.33,B");
    }

    #[test]
    fn test_encode_writes_header_first() {
        let text = encode(sample_store().records());
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(lines.next(), Some("1,Alice Johnson,3,85;90;78,84.33,B"));
        assert_eq!(lines.next(), Some("2,Bob,2,40;55,47.50,F"));
        assert_eq!(lines.next(), Some("3,Smith  John,1,100,100.00,A"));
        assert_eq!(lines.next(), None);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_encode_empty_store_is_header_only() {
        assert_eq!(encode(&[]), format!("{HEADER}\n"));
    }

    #[test]
    fn test_decode_round_trip_is_byte_identical() {
        let first = encode(sample_store().records());
        let decoded = decode(&first, &limits());
        let second = encode(decoded.store.records());

        assert_eq!(decoded.skipped, 0);
        assert_eq!(first, second);
        assert_eq!(decoded.store.records(), sample_store().records());
    }

    #[test]
    fn test_decode_without_header() {
        let text = "1,Alice,1,90,90.00,A\n2,Bob,1,70,70.00,C\n";
        let decoded = decode(text, &limits());

        assert_eq!(decoded.store.len(), 2);
        assert_eq!(decoded.store.records()[0].name(), "Alice");
    }

    #[test]
    fn test_decode_accepts_roll_header() {
        let text = "roll,name,subjectCount,marks,average,grade\n1,Alice,1,90,90.00,A\n";
        let decoded = decode(text, &limits());

        assert_eq!(decoded.store.len(), 1);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_decode_crlf_line_endings() {
        let text = "id,name,subjects,scores,average,grade\r\n1,Alice,2,90;80,85.00,B\r\n";
        let decoded = decode(text, &limits());

        assert_eq!(decoded.store.len(), 1);
        let record = &decoded.store.records()[0];
        assert_eq!(record.name(), "Alice");
        assert_eq!(record.grade(), Grade::B);
    }

    #[test]
    fn test_decode_skips_score_count_mismatch() {
        let text = format!(
            "{HEADER}\n1,Alice,4,90;80;70,80.00,B\n2,Bob,3,90;80;70,80.00,B\n"
        );
        let decoded = decode(&text, &limits());

        assert_eq!(decoded.store.len(), 1);
        assert_eq!(decoded.skipped, 1);
        assert_eq!(decoded.store.records()[0].name(), "Bob");
    }

    #[test]
    fn test_decode_record_reasons() {
        let l = limits();

        assert_eq!(
            decode_record("1,Alice,1,90", &l),
            Err(MalformedLine::TooFewFields { found: 4 })
        );
        assert!(matches!(
            decode_record("x,Alice,1,90,90.00,A", &l),
            Err(MalformedLine::InvalidNumber { field: "id", .. })
        ));
        assert_eq!(
            decode_record("0,Alice,1,90,90.00,A", &l),
            Err(MalformedLine::ZeroId)
        );
        assert_eq!(
            decode_record("1,Alice,11,90,90.00,A", &l),
            Err(MalformedLine::SubjectCount { found: 11, max: 10 })
        );
        assert_eq!(
            decode_record("1,Alice,0,90,90.00,A", &l),
            Err(MalformedLine::SubjectCount { found: 0, max: 10 })
        );
        assert!(matches!(
            decode_record("1,Alice,1,abc,90.00,A", &l),
            Err(MalformedLine::InvalidNumber { field: "score", .. })
        ));
        assert!(matches!(
            decode_record("1,Alice,1,90,ninety,A", &l),
            Err(MalformedLine::InvalidNumber { field: "average", .. })
        ));
        assert_eq!(
            decode_record("1,Alice,1,90,90.00,", &l),
            Err(MalformedLine::MissingGrade)
        );
        assert!(matches!(
            decode_record("1,Alice,1,101,101.00,A", &l),
            Err(MalformedLine::Invalid(_))
        ));
        assert!(matches!(
            decode_record("1,,1,90,90.00,A", &l),
            Err(MalformedLine::Invalid(_))
        ));
    }

    #[test]
    fn test_decode_shortens_long_names() {
        let l = Limits {
            max_name_length: 5,
            ..Limits::default()
        };
        let text = "1,Alice,1,90,90.00,A\n2,Bob Smith,1,70,70.00,C\n3,Carolyn,1,60,60.00,C\n";
        let decoded = decode(text, &l);

        assert_eq!(decoded.skipped, 0);
        let names: Vec<&str> = decoded.store.records().iter().map(Record::name).collect();
        assert_eq!(names, ["Alice", "Bob S", "Carol"]);
        assert_eq!(decoded.store.next_id().unwrap(), 4);
    }

    #[test]
    fn test_decode_shortened_name_drops_trailing_space() {
        let l = Limits {
            max_name_length: 4,
            ..Limits::default()
        };
        let record = decode_record("2,Bob Smith,1,70,70.00,C", &l).unwrap();

        assert_eq!(record.name(), "Bob");
    }

    #[test]
    fn test_decode_skips_byte_order_mark() {
        let text = "\u{feff}id,name,subjects,scores,average,grade\n1,Alice,1,90,90.00,A\n";
        let decoded = decode(text, &limits());

        assert_eq!(decoded.store.len(), 1);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_decode_tolerates_spaces_around_fields() {
        let record = decode_record("1, Alice Johnson, 3, 85;90;78, 84.33, B", &limits()).unwrap();

        assert_eq!(record.id(), 1);
        assert_eq!(record.name(), "Alice Johnson");
        assert_eq!(record.scores(), &[85, 90, 78]);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let record = decode_record("1,Alice,1,90,90.00,A,extra", &limits()).unwrap();
        assert_eq!(record.name(), "Alice");
    }

    #[test]
    fn test_decode_recomputes_derived_fields() {
        let record = decode_record("1,Alice,2,90;80,12.34,F", &limits()).unwrap();

        assert!((record.average() - 85.0).abs() < f64::EPSILON);
        assert_eq!(record.grade(), Grade::B);
    }

    #[test]
    fn test_decode_skips_duplicate_ids() {
        let text = "1,Alice,1,90,90.00,A\n1,Bob,1,70,70.00,C\n";
        let decoded = decode(text, &limits());

        assert_eq!(decoded.store.len(), 1);
        assert_eq!(decoded.skipped, 1);
        assert_eq!(decoded.store.records()[0].name(), "Alice");
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let text = format!("{HEADER}\n\n1,Alice,1,90,90.00,A\n   \n");
        let decoded = decode(&text, &limits());

        assert_eq!(decoded.store.len(), 1);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_decode_stops_at_capacity() {
        let l = Limits {
            max_records: 2,
            ..Limits::default()
        };
        let text = "1,A,1,1,1.00,F\n2,B,1,2,2.00,F\n3,C,1,3,3.00,F\n";
        let decoded = decode(text, &l);

        assert_eq!(decoded.store.len(), 2);
        assert!(decoded.truncated);
    }

    #[test]
    fn test_decode_preserves_file_order_and_next_id() {
        let text = "7,G,1,70,70.00,C\n3,C,1,30,30.00,F\n";
        let decoded = decode(text, &limits());

        let ids: Vec<u32> = decoded.store.records().iter().map(Record::id).collect();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(decoded.store.next_id().unwrap(), 8);
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("students.csv");
        let store = sample_store();

        write_file(&path, store.records()).unwrap();
        let decoded = read_file(&path, &limits()).unwrap();

        assert_eq!(decoded.store.records(), store.records());
        assert_eq!(fs::read_to_string(&path).unwrap(), encode(store.records()));
    }

    #[test]
    fn test_write_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");

        write_file(&path, sample_store().records()).unwrap();
        write_file(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{HEADER}\n"));
    }

    #[test]
    fn test_write_file_to_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_file(dir.path(), sample_store().records());

        assert!(matches!(result, Err(Error::FileWrite { .. })));
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = read_file(&dir.path().join("absent.csv"), &limits()).unwrap();

        assert!(decoded.store.is_empty());
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_read_file_with_invalid_utf8_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        let mut bytes = b"1,Alice,1,90,90.00,A\n2,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b",1,70,70.00,C\n");
        fs::write(&path, bytes).unwrap();

        let decoded = read_file(&path, &limits()).unwrap();
        assert_eq!(decoded.store.len(), 2);
        assert_eq!(decoded.store.records()[0].name(), "Alice");
    }
}
