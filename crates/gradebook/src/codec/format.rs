//! Flat-file format definitions for gradebook.
//!
//! One header line followed by one line per record:
//!
//! ```text
//! id,name,subjects,scores,average,grade
//! 1,Alice Johnson,3,85;90;78,84.33,B
//! ```

/// Separates the fields of a record line.
pub const FIELD_DELIMITER: char = ',';

/// Separates the individual scores inside the scores field.
pub const SCORE_DELIMITER: char = ';';

/// Terminates a record line.
pub const RECORD_DELIMITER: char = '\n';

/// Header line written at the top of every data file.
pub const HEADER: &str = "id,name,subjects,scores,average,grade";

/// A first line starting with any of these is a header, not data.
///
/// Older data files call the id column `roll`.
pub const HEADER_PREFIXES: &[&str] = &["id,", "roll,"];

/// Number of fields in a record line.
pub const FIELD_COUNT: usize = 6;

/// Digits after the decimal point when writing averages.
pub const AVERAGE_PRECISION: usize = 2;

/// Whether `line` is a header line.
#[must_use]
pub fn is_header(line: &str) -> bool {
    HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_has_field_count_fields() {
        assert_eq!(HEADER.split(FIELD_DELIMITER).count(), FIELD_COUNT);
    }

    #[test]
    fn test_is_header() {
        assert!(is_header(HEADER));
        assert!(is_header("roll,name,subjectCount,marks,average,grade"));
        assert!(!is_header("1,Alice,1,90,90.00,A"));
        assert!(!is_header(""));
    }
}
