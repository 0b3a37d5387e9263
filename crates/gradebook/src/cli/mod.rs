//! Command-line interface for gradebook.
//!
//! This module provides the CLI structure, the subcommand definitions, and the
//! interactive menu shell used when no subcommand is given.

mod commands;
pub mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, ExportCommand, ListCommand, SearchCommand,
    ShowCommand, SortCommand, SortKeyArg, StatsCommand, UpdateCommand,
};
pub use shell::Shell;

/// gradebook - Keep track of students and their scores
///
/// Records are stored in a plain delimited text file and rewritten after every
/// change. Run without a subcommand for the interactive menu.
#[derive(Debug, Parser)]
#[command(name = "gradebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data file to use instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// The command to execute (defaults to `shell`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a student
    Add(AddCommand),

    /// List all students
    List(ListCommand),

    /// Show one student in detail
    Show(ShowCommand),

    /// Find students by name
    Search(SearchCommand),

    /// Change a student's name or scores
    Update(UpdateCommand),

    /// Remove a student
    Delete(DeleteCommand),

    /// Reorder the stored records
    Sort(SortCommand),

    /// Show class statistics
    Stats(StatsCommand),

    /// Write the text report
    Export(ExportCommand),

    /// Start the interactive menu
    Shell,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
