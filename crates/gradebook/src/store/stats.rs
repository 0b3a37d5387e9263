//! Class-wide statistics.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::record::{Grade, Record};

/// Summary over every record in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Number of records.
    pub count: usize,
    /// Mean of all record averages.
    pub class_average: f64,
    /// Record with the highest average (first one on ties).
    pub top: Record,
    /// Record with the lowest average (first one on ties).
    pub bottom: Record,
    /// Number of records per grade.
    pub grade_counts: GradeCounts,
}

/// Number of records holding each grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    #[serde(rename = "A")]
    a: usize,
    #[serde(rename = "B")]
    b: usize,
    #[serde(rename = "C")]
    c: usize,
    #[serde(rename = "D")]
    d: usize,
    #[serde(rename = "F")]
    f: usize,
}

impl GradeCounts {
    /// Count for one grade.
    #[must_use]
    pub fn get(&self, grade: Grade) -> usize {
        match grade {
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D => self.d,
            Grade::F => self.f,
        }
    }

    fn bump(&mut self, grade: Grade) {
        let slot = match grade {
            Grade::A => &mut self.a,
            Grade::B => &mut self.b,
            Grade::C => &mut self.c,
            Grade::D => &mut self.d,
            Grade::F => &mut self.f,
        };
        *slot += 1;
    }
}

impl Statistics {
    /// Compute statistics in a single pass over `records`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStore`] if `records` is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(records: &[Record]) -> Result<Self> {
        let first = records.first().ok_or(Error::EmptyStore)?;

        let mut sum = 0.0;
        let mut top = first;
        let mut bottom = first;
        let mut grade_counts = GradeCounts::default();

        for record in records {
            sum += record.average();
            if record.average() > top.average() {
                top = record;
            }
            if record.average() < bottom.average() {
                bottom = record;
            }
            grade_counts.bump(record.grade());
        }

        Ok(Self {
            count: records.len(),
            class_average: sum / records.len() as f64,
            top: top.clone(),
            bottom: bottom.clone(),
            grade_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, scores: Vec<u8>) -> Record {
        Record::new(id, format!("Student {id}"), scores)
    }

    #[test]
    fn test_statistics_basic() {
        let records = vec![record(1, vec![60]), record(2, vec![80]), record(3, vec![70])];
        let stats = Statistics::compute(&records).unwrap();

        assert_eq!(stats.count, 3);
        assert!((stats.class_average - 70.0).abs() < 1e-9);
        assert_eq!(stats.top.id(), 2);
        assert_eq!(stats.bottom.id(), 1);
    }

    #[test]
    fn test_statistics_ties_keep_first() {
        let records = vec![
            record(1, vec![80]),
            record(2, vec![80]),
            record(3, vec![50]),
            record(4, vec![50]),
        ];
        let stats = Statistics::compute(&records).unwrap();

        assert_eq!(stats.top.id(), 1);
        assert_eq!(stats.bottom.id(), 3);
    }

    #[test]
    fn test_statistics_single_record() {
        let records = vec![record(5, vec![42])];
        let stats = Statistics::compute(&records).unwrap();

        assert_eq!(stats.top.id(), 5);
        assert_eq!(stats.bottom.id(), 5);
        assert_eq!(stats.grade_counts.get(Grade::F), 1);
    }

    #[test]
    fn test_grade_counts() {
        let records = vec![
            record(1, vec![95]),
            record(2, vec![76]),
            record(3, vec![65]),
            record(4, vec![61]),
            record(5, vec![10]),
        ];
        let counts = Statistics::compute(&records).unwrap().grade_counts;

        assert_eq!(counts.get(Grade::A), 1);
        assert_eq!(counts.get(Grade::B), 1);
        assert_eq!(counts.get(Grade::C), 2);
        assert_eq!(counts.get(Grade::D), 0);
        assert_eq!(counts.get(Grade::F), 1);
    }

    #[test]
    fn test_statistics_empty() {
        assert!(matches!(Statistics::compute(&[]), Err(Error::EmptyStore)));
    }

    #[test]
    fn test_statistics_serialize() {
        let records = vec![record(1, vec![90])];
        let json = serde_json::to_string(&Statistics::compute(&records).unwrap()).unwrap();

        assert!(json.contains("\"class_average\":90.0"));
        assert!(json.contains("\"A\":1"));
    }
}
