//! Command-line client for the Decision Ledger.
//!
//! Deploys a SQLite-backed ledger, appends decisions on behalf of a key
//! holder, and queries records. Output is one JSON object per line.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};
pub use commands::run;
