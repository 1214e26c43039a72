//! Delimited-text report export guarded by filesystem job locks.
//!
//! A scheduler asks the [`coordinator::ConcurrencyCoordinator`] which jobs of a
//! connection are running, locks the job it is about to run, streams the rows
//! of a [`cursor::RowCursor`] through a [`writer::DelimitedReportWriter`], and
//! unlocks the job afterwards. [`runner::ReportJobRunner`] packages that sequence.

pub mod column;
pub mod coordinator;
pub mod cursor;
pub mod error;
pub mod formatter;
pub mod location;
pub mod runner;
pub mod source;
pub mod value;
pub mod writer;

/// Identifies one report job within a connection.
pub type JobId = i64;
