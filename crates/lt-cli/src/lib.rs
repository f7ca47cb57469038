//! Drivers behind the `lighttable` and `lt-check-results` binaries.

pub mod check;
pub mod generate;

pub use check::{check_results, CheckReport};
pub use generate::{generate, RunSummary};
