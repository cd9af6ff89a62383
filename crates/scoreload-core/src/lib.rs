//! Load driver: request/check/sleep iterations executed by concurrent virtual users

pub mod checks;
pub mod driver;
pub mod interrupt;
pub mod tally;

pub use checks::{CheckResult, Observed};
pub use driver::{run, Driver, IterationReport};
pub use tally::{CheckTally, RunSummary};
