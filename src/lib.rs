//! itest library
//!
//! Configuration, the dry-run backend and the CLI command set, exposed for
//! integration testing.

pub mod cli;
pub mod config;
pub mod dry_run;

pub use config::ItestConfig;
pub use dry_run::{DryRunProvider, DryRunSession};
