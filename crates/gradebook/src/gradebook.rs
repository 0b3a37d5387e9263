//! Write-through persistence around the record store.
//!
//! A [`Gradebook`] owns one [`RecordStore`] and the path of its data file.
//! Every successful mutation is followed by a full rewrite of the file, so
//! the file on disk always reflects the last change that succeeded.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec;
use crate::config::{Config, Limits};
use crate::error::Result;
use crate::record::Record;
use crate::report;
use crate::store::{RecordStore, SortDirection, SortKey, Statistics};

/// A record store bound to its data file.
#[derive(Debug)]
pub struct Gradebook {
    path: PathBuf,
    store: RecordStore,
    skipped_on_load: usize,
}

impl Gradebook {
    /// Open the data file named by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::open(config.data_file(), config.limits)
    }

    /// Load the data file at `path`.
    ///
    /// A missing or unreadable file is not fatal: the gradebook starts empty
    /// and the first mutation creates the file.
    pub fn open(path: impl AsRef<Path>, limits: Limits) -> Self {
        let path = path.as_ref().to_path_buf();

        let (store, skipped_on_load) = match codec::read_file(&path, &limits) {
            Ok(decoded) => {
                if decoded.skipped > 0 {
                    warn!(
                        path = %path.display(),
                        skipped = decoded.skipped,
                        "Some lines in the data file were skipped"
                    );
                }
                if decoded.truncated {
                    warn!(
                        max = limits.max_records,
                        "Data file holds more records than allowed; the rest were ignored"
                    );
                }
                (decoded.store, decoded.skipped)
            }
            Err(e) => {
                warn!(error = %e, "Could not read data file; starting empty");
                (RecordStore::new(limits), 0)
            }
        };

        info!(path = %path.display(), records = store.len(), "Opened gradebook");
        Self {
            path,
            store,
            skipped_on_load,
        }
    }

    /// Path of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Records in current order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.store.records()
    }

    /// Number of malformed lines skipped when the file was loaded.
    #[must_use]
    pub fn skipped_on_load(&self) -> usize {
        self.skipped_on_load
    }

    /// Add a record and persist.
    ///
    /// # Errors
    ///
    /// Returns the store's validation error, or a write error. On a write
    /// error the record stays in memory.
    pub fn add(&mut self, name: &str, scores: Vec<u8>) -> Result<Record> {
        let record = self.store.add(name, scores)?;
        info!(id = record.id(), name = record.name(), "Added student");
        self.save()?;
        Ok(record)
    }

    /// Look up a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] for an unknown id.
    pub fn find_by_id(&self, id: u32) -> Result<&Record> {
        self.store.find_by_id(id)
    }

    /// Records whose name contains `query`, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, query: &str) -> Vec<&Record> {
        self.store.find_by_name(query)
    }

    /// Replace a record's name and/or scores and persist.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or a write error. On a write error the
    /// change stays in memory.
    pub fn update(
        &mut self,
        id: u32,
        name: Option<&str>,
        scores: Option<Vec<u8>>,
    ) -> Result<Record> {
        let record = self.store.update(id, name, scores)?;
        info!(id, "Updated student");
        self.save()?;
        Ok(record)
    }

    /// Remove a record and persist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] for an unknown id, or a write error.
    pub fn delete(&mut self, id: u32) -> Result<Record> {
        let record = self.store.delete(id)?;
        info!(id, "Deleted student");
        self.save()?;
        Ok(record)
    }

    /// Reorder the records and persist the new order.
    ///
    /// # Errors
    ///
    /// Returns a write error if the file cannot be rewritten.
    pub fn sort_by(&mut self, key: SortKey, direction: SortDirection) -> Result<()> {
        self.store.sort_by(key, direction);
        info!(?key, ?direction, "Sorted students");
        self.save()
    }

    /// Class-wide statistics.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EmptyStore`] if there are no records.
    pub fn statistics(&self) -> Result<Statistics> {
        self.store.statistics()
    }

    /// Write the text report to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EmptyStore`] or a write error.
    pub fn export_report(&self, path: &Path) -> Result<()> {
        report::export(path, &self.store)
    }

    /// Rewrite the data file from the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        codec::write_file(&self.path, self.store.records()).map_err(|e| {
            warn!(error = %e, "Failed to save records; changes are kept in memory only");
            e
        })
    }

    /// Flush the store to disk and release it.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub fn close(self) -> Result<()> {
        self.save()?;
        info!(path = %self.path.display(), records = self.store.len(), "Closed gradebook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;

    fn open_temp() -> (tempfile::TempDir, Gradebook) {
        crate::logging::init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let book = Gradebook::open(dir.path().join("students.csv"), Limits::default());
        (dir, book)
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, book) = open_temp();

        assert!(book.store().is_empty());
        assert_eq!(book.skipped_on_load(), 0);
        assert!(!book.path().exists());
    }

    #[test]
    fn test_add_persists_immediately() {
        let (_dir, mut book) = open_temp();
        book.add("Alice", vec![85, 90, 78]).unwrap();

        let contents = fs::read_to_string(book.path()).unwrap();
        assert_eq!(
            contents,
            "id,name,subjects,scores,average,grade\n1,Alice,3,85;90;78,84.33,B\n"
        );
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let (dir, mut book) = open_temp();
        book.add("Alice", vec![70]).unwrap();
        book.add("Bob", vec![95]).unwrap();
        book.add("Carol", vec![82]).unwrap();
        book.update(1, Some("Alicia"), None).unwrap();
        book.delete(3).unwrap();
        book.sort_by(SortKey::Average, SortDirection::Descending).unwrap();

        let reopened = Gradebook::open(dir.path().join("students.csv"), Limits::default());
        let names: Vec<&str> = reopened.records().iter().map(Record::name).collect();
        assert_eq!(names, ["Bob", "Alicia"]);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let (dir, mut book) = open_temp();
        book.add("Alice", vec![70]).unwrap();
        book.add("Bob", vec![80]).unwrap();
        book.delete(1).unwrap();

        let mut reopened = Gradebook::open(dir.path().join("students.csv"), Limits::default());
        let record = reopened.add("Carol", vec![90]).unwrap();
        assert_eq!(record.id(), 3);
    }

    #[test]
    fn test_lower_name_limit_keeps_records_on_rewrite() {
        let (dir, mut book) = open_temp();
        book.add("Alice", vec![70]).unwrap();
        book.add("Bob Smith", vec![80]).unwrap();

        let path = dir.path().join("students.csv");
        let limits = Limits {
            max_name_length: 5,
            ..Limits::default()
        };
        let mut reopened = Gradebook::open(&path, limits);
        assert_eq!(reopened.skipped_on_load(), 0);

        let carl = reopened.add("Carl", vec![60]).unwrap();
        assert_eq!(carl.id(), 3);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n2,Bob S,1,80,80.00,B\n"));
        assert!(contents.contains("\n3,Carl,1,60,60.00,C\n"));
    }

    #[test]
    fn test_rejected_mutation_does_not_write() {
        let (_dir, mut book) = open_temp();

        let err = book.add("", vec![50]).unwrap_err();
        assert!(err.is_user_error());
        assert!(!book.path().exists());
    }

    #[test]
    fn test_open_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        fs::write(
            &path,
            "id,name,subjects,scores,average,grade\n1,Alice,4,80;90;70,80.00,B\n2,Bob,1,60,60.00,C\n",
        )
        .unwrap();

        let book = Gradebook::open(&path, Limits::default());
        assert_eq!(book.store().len(), 1);
        assert_eq!(book.skipped_on_load(), 1);
        assert_eq!(book.records()[0].name(), "Bob");
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file
        let book = Gradebook::open(dir.path(), Limits::default());

        assert!(book.store().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        crate::logging::init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let mut book = Gradebook::open(dir.path(), Limits::default());

        let err = book.add("Alice", vec![90]).unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
        assert!(!err.is_user_error());
        assert_eq!(book.store().len(), 1);
        assert_eq!(book.find_by_id(1).unwrap().name(), "Alice");
    }

    #[test]
    fn test_export_report() {
        let (dir, mut book) = open_temp();
        let report_path = dir.path().join("report.txt");

        assert!(matches!(
            book.export_report(&report_path),
            Err(Error::EmptyStore)
        ));

        book.add("Alice", vec![60]).unwrap();
        book.export_report(&report_path).unwrap();
        let report = fs::read_to_string(&report_path).unwrap();
        assert!(report.contains("Total students : 1"));
    }

    #[test]
    fn test_close_flushes() {
        let (dir, mut book) = open_temp();
        book.add("Alice", vec![60]).unwrap();
        let path = dir.path().join("students.csv");
        fs::remove_file(&path).unwrap();

        book.close().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_from_config_uses_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_file = Some(dir.path().join("custom.csv"));

        let mut book = Gradebook::from_config(&config);
        book.add("Alice", vec![60]).unwrap();
        assert!(dir.path().join("custom.csv").exists());
    }
}
