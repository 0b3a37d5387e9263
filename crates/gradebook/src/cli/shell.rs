//! Interactive menu for gradebook.
//!
//! The shell reads whole lines from any [`BufRead`] and writes prompts and
//! tables to any [`Write`], so it runs the same against a terminal or an
//! in-memory buffer. Numeric answers are range-checked and asked again until
//! they are valid. End of input is treated like choosing exit.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::error::Result;
use crate::gradebook::Gradebook;
use crate::record::{MAX_SCORE, MIN_SCORE};
use crate::report;
use crate::store::{SortDirection, SortKey};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const MENU: &str = "\
==============================================
          Student Management System
==============================================
 1. Add student
 2. View all students
 3. Search by ID
 4. Search by name
 5. Update student
 6. Delete student
 7. Sort records
 8. Statistics
 9. Export report
 0. Save & exit
----------------------------------------------";

const SORT_MENU: &str = "\
 1. ID (ascending)
 2. ID (descending)
 3. Name (A-Z)
 4. Name (Z-A)
 5. Average (lowest first)
 6. Average (highest first)";

/// Whether the menu loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// Menu-driven front end over a [`Gradebook`].
#[derive(Debug)]
pub struct Shell<'a, R, W> {
    book: &'a mut Gradebook,
    report_file: PathBuf,
    input: R,
    output: W,
    interactive: bool,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Create a shell reading answers from `input` and writing to `output`.
    #[must_use]
    pub fn new(book: &'a mut Gradebook, report_file: PathBuf, input: R, output: W) -> Self {
        Self {
            book,
            report_file,
            input,
            output,
            interactive: false,
        }
    }

    /// Clear the screen before each menu and pause after each action.
    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Run the menu loop until exit or end of input, then flush the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written, or if the
    /// final save fails. Failures of individual actions are printed and the
    /// loop continues.
    pub fn run(mut self) -> Result<()> {
        let skipped = self.book.skipped_on_load();
        if skipped > 0 {
            writeln!(
                self.output,
                "Note: {skipped} malformed line(s) in the data file were skipped."
            )?;
        }

        loop {
            if self.interactive {
                write!(self.output, "{CLEAR_SCREEN}")?;
            }
            writeln!(self.output, "{MENU}")?;

            let Some(choice) = self.prompt_number("Enter choice: ", 0u8, 9)? else {
                break;
            };
            debug!(choice, "Menu selection");

            let step = match choice {
                1 => self.add()?,
                2 => self.view_all()?,
                3 => self.search_by_id()?,
                4 => self.search_by_name()?,
                5 => self.update()?,
                6 => self.delete()?,
                7 => self.sort()?,
                8 => self.statistics()?,
                9 => self.export()?,
                _ => Step::Quit,
            };
            if step == Step::Quit || self.pause()? == Step::Quit {
                break;
            }
        }

        writeln!(self.output, "Saving & exiting... Bye!")?;
        self.output.flush()?;
        self.book.save()
    }

    fn add(&mut self) -> Result<Step> {
        if self.book.store().is_full() {
            writeln!(
                self.output,
                "Cannot add more students (limit of {} reached).",
                self.book.store().limits().max_records
            )?;
            return Ok(Step::Continue);
        }

        let Some(name) = self.prompt_line("Enter name: ")? else {
            return Ok(Step::Quit);
        };
        if name.trim().is_empty() {
            writeln!(self.output, "Name cannot be empty.")?;
            return Ok(Step::Continue);
        }
        let Some(scores) = self.prompt_scores()? else {
            return Ok(Step::Quit);
        };

        match self.book.add(&name, scores) {
            Ok(record) => writeln!(
                self.output,
                "Added: ID {} | {} | Avg: {:.2} | Grade: {}",
                record.id(),
                record.name(),
                record.average(),
                record.grade()
            )?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn view_all(&mut self) -> Result<Step> {
        if self.book.store().is_empty() {
            writeln!(self.output, "No records to display.")?;
        } else {
            write!(self.output, "{}", report::render_table(self.book.records()))?;
        }
        Ok(Step::Continue)
    }

    fn search_by_id(&mut self) -> Result<Step> {
        if self.book.store().is_empty() {
            writeln!(self.output, "No records.")?;
            return Ok(Step::Continue);
        }
        let Some(id) = self.prompt_id()? else {
            return Ok(Step::Quit);
        };

        match self.book.find_by_id(id) {
            Ok(record) => write!(self.output, "{}", report::render_detail(record))?,
            Err(e) => writeln!(self.output, "{e}.")?,
        }
        Ok(Step::Continue)
    }

    fn search_by_name(&mut self) -> Result<Step> {
        if self.book.store().is_empty() {
            writeln!(self.output, "No records.")?;
            return Ok(Step::Continue);
        }
        let Some(query) = self.prompt_line("Enter name or part of it: ")? else {
            return Ok(Step::Quit);
        };
        if query.trim().is_empty() {
            writeln!(self.output, "Search query cannot be empty.")?;
            return Ok(Step::Continue);
        }

        let hits = self.book.find_by_name(&query);
        if hits.is_empty() {
            writeln!(self.output, "No matches for \"{query}\".")?;
        } else {
            write!(self.output, "{}", report::render_table(hits))?;
        }
        Ok(Step::Continue)
    }

    fn update(&mut self) -> Result<Step> {
        let Some(id) = self.prompt_id()? else {
            return Ok(Step::Quit);
        };
        let name = match self.book.find_by_id(id) {
            Ok(record) => record.name().to_string(),
            Err(e) => {
                writeln!(self.output, "{e}.")?;
                return Ok(Step::Continue);
            }
        };

        writeln!(self.output, "Editing ID {id} ({name})")?;
        writeln!(self.output, " 1. Name\n 2. Scores\n 3. Cancel")?;
        let Some(field) = self.prompt_number("Choose field: ", 1u8, 3)? else {
            return Ok(Step::Quit);
        };

        let result = match field {
            1 => {
                let Some(new_name) = self.prompt_line("New name (leave empty to keep): ")? else {
                    return Ok(Step::Quit);
                };
                if new_name.trim().is_empty() {
                    writeln!(self.output, "Name unchanged.")?;
                    return Ok(Step::Continue);
                }
                self.book.update(id, Some(&new_name), None)
            }
            2 => {
                let Some(scores) = self.prompt_scores()? else {
                    return Ok(Step::Quit);
                };
                self.book.update(id, None, Some(scores))
            }
            _ => {
                writeln!(self.output, "Update cancelled.")?;
                return Ok(Step::Continue);
            }
        };

        match result {
            Ok(record) => writeln!(
                self.output,
                "Updated: ID {} | {} | Avg: {:.2} | Grade: {}",
                record.id(),
                record.name(),
                record.average(),
                record.grade()
            )?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn delete(&mut self) -> Result<Step> {
        let Some(id) = self.prompt_id()? else {
            return Ok(Step::Quit);
        };
        let name = match self.book.find_by_id(id) {
            Ok(record) => record.name().to_string(),
            Err(e) => {
                writeln!(self.output, "{e}.")?;
                return Ok(Step::Continue);
            }
        };

        let Some(answer) = self.prompt_line(&format!("Delete ID {id} ({name})? (y/n): "))? else {
            return Ok(Step::Quit);
        };
        if !is_yes(&answer) {
            writeln!(self.output, "Delete cancelled.")?;
            return Ok(Step::Continue);
        }

        match self.book.delete(id) {
            Ok(_) => writeln!(self.output, "Deleted ID {id}.")?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn sort(&mut self) -> Result<Step> {
        writeln!(self.output, "{SORT_MENU}")?;
        let Some(choice) = self.prompt_number("Sort by: ", 1u8, 6)? else {
            return Ok(Step::Quit);
        };

        let (key, direction) = match choice {
            1 => (SortKey::Id, SortDirection::Ascending),
            2 => (SortKey::Id, SortDirection::Descending),
            3 => (SortKey::Name, SortDirection::Ascending),
            4 => (SortKey::Name, SortDirection::Descending),
            5 => (SortKey::Average, SortDirection::Ascending),
            _ => (SortKey::Average, SortDirection::Descending),
        };

        match self.book.sort_by(key, direction) {
            Ok(()) => writeln!(self.output, "Sorted.")?,
            Err(e) => writeln!(self.output, "Sorted, but {e}")?,
        }
        self.view_all()
    }

    fn statistics(&mut self) -> Result<Step> {
        match self.book.statistics() {
            Ok(stats) => write!(self.output, "{}", report::render_statistics(&stats))?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn export(&mut self) -> Result<Step> {
        match self.book.export_report(&self.report_file) {
            Ok(()) => writeln!(
                self.output,
                "Report written to {}.",
                self.report_file.display()
            )?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn pause(&mut self) -> Result<Step> {
        if !self.interactive {
            return Ok(Step::Continue);
        }
        Ok(match self.prompt_line("\nPress Enter to continue...")? {
            Some(_) => Step::Continue,
            None => Step::Quit,
        })
    }

    fn prompt_id(&mut self) -> Result<Option<u32>> {
        self.prompt_number("Enter ID: ", 1u32, u32::MAX)
    }

    fn prompt_scores(&mut self) -> Result<Option<Vec<u8>>> {
        let max_subjects = self.book.store().limits().max_subjects;
        let Some(count) = self.prompt_number(
            &format!("Number of subjects (1-{max_subjects}): "),
            1usize,
            max_subjects,
        )?
        else {
            return Ok(None);
        };

        let mut scores = Vec::with_capacity(count);
        for subject in 1..=count {
            let prompt = format!("Score for subject {subject} ({MIN_SCORE}-{MAX_SCORE}): ");
            let Some(score) = self.prompt_number(&prompt, MIN_SCORE, MAX_SCORE)? else {
                return Ok(None);
            };
            scores.push(score);
        }
        Ok(Some(scores))
    }

    /// Ask until the answer parses and lies in `min..=max`.
    fn prompt_number<T>(&mut self, prompt: &str, min: T, max: T) -> Result<Option<T>>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        loop {
            let Some(line) = self.prompt_line(prompt)? else {
                return Ok(None);
            };
            match line.trim().parse::<T>() {
                Ok(n) if n >= min && n <= max => return Ok(Some(n)),
                _ => writeln!(
                    self.output,
                    "Invalid input. Please enter a number between {min} and {max}."
                )?,
            }
        }
    }

    /// One line of input without its terminator, or `None` at end of input.
    fn prompt_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        // Raw bytes so a stray non-UTF-8 byte is replaced, not fatal
        let mut bytes = Vec::new();
        if self.input.read_until(b'\n', &mut bytes)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&bytes);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES")
}
