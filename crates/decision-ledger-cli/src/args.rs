//! CLI argument definitions using clap
//!
//! Commands:
//! - dledger deploy --ledger <path> [--allow <pubkey>]...
//! - dledger log <category> <message> --key <seed>
//! - dledger get <id>
//! - dledger count
//! - dledger list [--from <id>] [--to <id>]
//! - dledger confirm <receipt>
//! - dledger keygen

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use decision_ledger_core::{DEFAULT_MAX_CATEGORY_LEN, DEFAULT_MAX_MESSAGE_LEN};

/// dledger - append-only decision ledger
#[derive(Parser, Debug)]
#[command(name = "dledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the ledger database
    #[arg(long, global = true, env = "DECISION_LEDGER")]
    pub ledger: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new, empty ledger and print its id
    Deploy {
        /// Hex public key allowed to append; repeat to allow several.
        /// The list is stored in the ledger and enforced on every later
        /// append. Without any, anyone may append.
        #[arg(long = "allow", value_name = "PUBKEY")]
        allow: Vec<String>,
    },

    /// Append a decision
    Log {
        /// Category label, e.g. "bootstrap"
        category: String,

        /// Free-text message
        message: String,

        /// Hex-encoded 32-byte Ed25519 seed identifying the author
        #[arg(long, env = "DECISION_LEDGER_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Maximum category length in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_CATEGORY_LEN)]
        max_category_len: usize,

        /// Maximum message length in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_LEN)]
        max_message_len: usize,
    },

    /// Print one record
    Get {
        /// Sequence id
        id: u64,
    },

    /// Print the number of records
    Count,

    /// Print records in [from, to), one JSON object per line
    List {
        #[arg(long, default_value_t = 0)]
        from: u64,

        #[arg(long, default_value_t = u64::MAX)]
        to: u64,
    },

    /// Resolve an operation receipt to its sequence id
    Confirm {
        /// Hex-encoded receipt
        receipt: String,
    },

    /// Generate a new author key
    Keygen,
}
