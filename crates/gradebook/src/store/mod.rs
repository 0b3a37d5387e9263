//! In-memory record store for gradebook.
//!
//! The store owns every student record in insertion (or last sort) order and
//! enforces the record invariants:
//! - ids are unique and assigned one past the highest id seen so far, so a
//!   deleted record's id is not handed out again
//! - derived fields always match the scores
//! - the store never grows past the configured capacity
//!
//! The store itself never touches the disk; see [`crate::Gradebook`] for the
//! write-through wrapper.

mod stats;

use std::cmp::Ordering;

use tracing::debug;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::record::{validate_name, validate_scores, Record};

pub use stats::{GradeCounts, Statistics};

/// Field used to order the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Numeric id.
    Id,
    /// Name, compared case-insensitively.
    Name,
    /// Average score.
    Average,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordered, bounded collection of student records.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    limits: Limits,
    // Highest id handed out or loaded, so deleting the newest record does
    // not free its id
    last_id: u32,
}

impl RecordStore {
    /// Create an empty store bounded by `limits`.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            records: Vec::new(),
            limits,
            last_id: 0,
        }
    }

    /// Build a store from records that were already validated (by the codec).
    pub(crate) fn from_records(records: Vec<Record>, limits: Limits) -> Self {
        let last_id = records.iter().map(Record::id).max().unwrap_or(0);
        Self {
            records,
            limits,
            last_id,
        }
    }

    /// The limits this store enforces.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether another record would exceed the capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.limits.max_records
    }

    /// All records in store order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Id the next added record will receive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the id space is exhausted.
    pub fn next_id(&self) -> Result<u32> {
        let max = self.records.iter().map(Record::id).max().unwrap_or(0);
        max.max(self.last_id)
            .checked_add(1)
            .ok_or_else(|| Error::invalid_input("no ids left to assign"))
    }

    /// Add a new record.
    ///
    /// The name is sanitized (delimiters become spaces) before validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the store is full, or
    /// [`Error::InvalidInput`] if the name or scores are invalid.
    pub fn add(&mut self, name: &str, scores: Vec<u8>) -> Result<Record> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                max: self.limits.max_records,
            });
        }

        let name = validate_name(name, &self.limits)?;
        validate_scores(&scores, &self.limits)?;
        let id = self.next_id()?;

        let record = Record::new(id, name, scores);
        self.last_id = id;
        debug!(id, average = record.average(), "Added record");
        self.records.push(record.clone());
        Ok(record)
    }

    /// Look up a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    pub fn find_by_id(&self, id: u32) -> Result<&Record> {
        self.records
            .iter()
            .find(|r| r.id() == id)
            .ok_or(Error::NotFound { id })
    }

    /// Records whose name contains `query`, ignoring case.
    ///
    /// An empty query matches every record.
    #[must_use]
    pub fn find_by_name(&self, query: &str) -> Vec<&Record> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name().to_lowercase().contains(&needle))
            .collect()
    }

    /// Replace the name and/or scores of a record.
    ///
    /// Both replacements are validated before either is applied, so a
    /// rejected update leaves the record untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id or
    /// [`Error::InvalidInput`] for an invalid replacement.
    pub fn update(
        &mut self,
        id: u32,
        name: Option<&str>,
        scores: Option<Vec<u8>>,
    ) -> Result<Record> {
        let index = self.index_of(id)?;

        let name = name.map(|n| validate_name(n, &self.limits)).transpose()?;
        if let Some(scores) = &scores {
            validate_scores(scores, &self.limits)?;
        }

        let record = &mut self.records[index];
        if let Some(name) = name {
            record.set_name(name);
        }
        if let Some(scores) = scores {
            record.set_scores(scores);
        }
        debug!(id, average = record.average(), "Updated record");
        Ok(record.clone())
    }

    /// Remove a record, keeping the remaining records in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    pub fn delete(&mut self, id: u32) -> Result<Record> {
        let index = self.index_of(id)?;
        let removed = self.records.remove(index);
        debug!(id, remaining = self.records.len(), "Deleted record");
        Ok(removed)
    }

    /// Reorder the store.
    ///
    /// Records that compare equal under `key` have no guaranteed relative
    /// order.
    pub fn sort_by(&mut self, key: SortKey, direction: SortDirection) {
        self.records.sort_by(|a, b| {
            let ordering = compare(a, b, key);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        debug!(?key, ?direction, "Sorted records");
    }

    /// Summary statistics over the whole store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStore`] if there are no records.
    pub fn statistics(&self) -> Result<Statistics> {
        Statistics::compute(&self.records)
    }

    fn index_of(&self, id: u32) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(Error::NotFound { id })
    }
}

fn compare(a: &Record, b: &Record, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id().cmp(&b.id()),
        SortKey::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortKey::Average => a.average().total_cmp(&b.average()),
    }
}
