//! Core record types for gradebook.
//!
//! This module defines the student record, its derived fields, and the
//! validation rules every record in the store obeys.

use serde::{Deserialize, Serialize};

use crate::codec::format::{FIELD_DELIMITER, RECORD_DELIMITER};
use crate::config::Limits;
use crate::error::{Error, Result};

/// Lowest accepted score.
pub const MIN_SCORE: u8 = 0;

/// Highest accepted score.
pub const MAX_SCORE: u8 = 100;

/// Letter grade derived from a record's average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// Average of 90 or above.
    A,
    /// Average of 75 or above.
    B,
    /// Average of 60 or above.
    C,
    /// Average of 50 or above.
    D,
    /// Anything lower.
    F,
}

impl Grade {
    /// All grades, best first.
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// Map an average onto the grade table. The first matching threshold wins.
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        if average >= 90.0 {
            Self::A
        } else if average >= 75.0 {
            Self::B
        } else if average >= 60.0 {
            Self::C
        } else if average >= 50.0 {
            Self::D
        } else {
            Self::F
        }
    }

    /// The single-character code used in files and tables.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::F => 'F',
        }
    }

    /// Parse a single-character grade code.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'F' => Some(Self::F),
            _ => None,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single student's identity, scores, and derived summary.
///
/// `average` and `grade` are always computed from `scores`; there is no way
/// to set them directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: u32,
    name: String,
    scores: Vec<u8>,
    average: f64,
    grade: Grade,
}

impl Record {
    /// Build a record from already-validated parts, computing derived fields.
    pub(crate) fn new(id: u32, name: String, scores: Vec<u8>) -> Self {
        let (average, grade) = derive(&scores);
        Self {
            id,
            name,
            scores,
            average,
            grade,
        }
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Student name, free of delimiter characters.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scores in subject order.
    #[must_use]
    pub fn scores(&self) -> &[u8] {
        &self.scores
    }

    /// Number of scored subjects.
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.scores.len()
    }

    /// Arithmetic mean of the scores.
    #[must_use]
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Letter grade for the average.
    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_scores(&mut self, scores: Vec<u8>) {
        let (average, grade) = derive(&scores);
        self.scores = scores;
        self.average = average;
        self.grade = grade;
    }
}

#[allow(clippy::cast_precision_loss)]
fn derive(scores: &[u8]) -> (f64, Grade) {
    if scores.is_empty() {
        return (0.0, Grade::F);
    }
    let sum: u32 = scores.iter().copied().map(u32::from).sum();
    let average = f64::from(sum) / scores.len() as f64;
    (average, Grade::from_average(average))
}

/// Replace characters that would break the persisted line format with spaces.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == FIELD_DELIMITER || c == RECORD_DELIMITER || c == '\r' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Sanitize a name and check it against the limits.
///
/// Surrounding whitespace is trimmed so names survive a save/load cycle
/// unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the name is blank or too long.
pub fn validate_name(name: &str, limits: &Limits) -> Result<String> {
    let name = sanitize_name(name).trim().to_string();
    if name.is_empty() {
        return Err(Error::invalid_input("name cannot be empty"));
    }
    let len = name.chars().count();
    if len > limits.max_name_length {
        return Err(Error::invalid_input(format!(
            "name is {len} characters long (max {})",
            limits.max_name_length
        )));
    }
    Ok(name)
}

/// Check a score list against the limits.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if there are no scores, too many scores,
/// or any score is outside `MIN_SCORE..=MAX_SCORE`.
pub fn validate_scores(scores: &[u8], limits: &Limits) -> Result<()> {
    if scores.is_empty() {
        return Err(Error::invalid_input("at least one score is required"));
    }
    if scores.len() > limits.max_subjects {
        return Err(Error::invalid_input(format!(
            "{} subjects given (max {})",
            scores.len(),
            limits.max_subjects
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !(MIN_SCORE..=MAX_SCORE).contains(*s)) {
        return Err(Error::invalid_input(format!(
            "score {bad} is out of range ({MIN_SCORE}-{MAX_SCORE})"
        )));
    }
    Ok(())
}
