//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::MAX_SCORE;
use crate::store::{SortDirection, SortKey};

fn score_parser() -> clap::builder::RangedI64ValueParser<u8> {
    clap::value_parser!(u8).range(0..=i64::from(MAX_SCORE))
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Student name
    pub name: String,

    /// One score per subject (0-100)
    #[arg(required = true, num_args = 1.., value_parser = score_parser())]
    pub scores: Vec<u8>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Student id
    pub id: u32,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Case-insensitive substring of the name
    pub query: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Update command arguments.
#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("changes")
        .required(true)
        .multiple(true)
        .args(["name", "scores"])
))]
pub struct UpdateCommand {
    /// Student id
    pub id: u32,

    /// New name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New scores, replacing all existing ones
    #[arg(short, long, num_args = 1.., value_parser = score_parser())]
    pub scores: Option<Vec<u8>>,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Student id
    pub id: u32,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Sort command arguments.
#[derive(Debug, Args)]
pub struct SortCommand {
    /// Field to sort by
    #[arg(value_enum)]
    pub key: SortKeyArg,

    /// Sort largest first
    #[arg(short, long)]
    pub desc: bool,
}

impl SortCommand {
    /// The requested direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        if self.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Report file (defaults to the configured report file)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Sort key argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKeyArg {
    /// Student id
    Id,
    /// Student name
    Name,
    /// Average score
    Average,
}

impl From<SortKeyArg> for SortKey {
    fn from(arg: SortKeyArg) -> Self {
        match arg {
            SortKeyArg::Id => Self::Id,
            SortKeyArg::Name => Self::Name,
            SortKeyArg::Average => Self::Average,
        }
    }
}
