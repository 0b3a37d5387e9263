//! `gradebook` - Student records kept in a flat text file
//!
//! This library provides the in-memory record store, the delimited file codec
//! that persists it, text reports, and the command-line front end used by the
//! `gradebook` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod gradebook;
pub mod logging;
pub mod record;
pub mod report;
pub mod store;

pub use config::{Config, Limits};
pub use error::{Error, Result};
pub use gradebook::Gradebook;
pub use logging::init_logging;
pub use record::{Grade, Record};
pub use store::{RecordStore, SortDirection, SortKey, Statistics};
