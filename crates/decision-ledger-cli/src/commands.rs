//! CLI command implementations
//!
//! Every command writes JSON lines to the given output. The ledger handle is
//! the database path; `deploy` creates it and every other command requires
//! it to exist already.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::debug;

use decision_ledger::{
    AllowList, Author, EntryLimits, Keypair, Ledger, LedgerConfig, NullNotifier,
    OperationReceipt, SequenceId, SystemContext,
};
use decision_ledger_store::{RecordStore, SqliteStore};

use crate::args::{Cli, Command};

/// Execute a parsed command line, writing results to `out`.
pub async fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let Cli { ledger, command } = cli;

    match command {
        Command::Keygen => keygen(out),
        Command::Deploy { allow } => {
            let writers = parse_writers(&allow)?;
            deploy(&ledger_path(ledger)?, writers.as_deref(), out)
        }
        Command::Log {
            category,
            message,
            key,
            max_category_len,
            max_message_len,
        } => {
            // Credentials are checked before the ledger is touched.
            let keypair = load_key(key.as_deref())?;
            let limits = EntryLimits::new(max_category_len, max_message_len);
            let path = ledger_path(ledger)?;
            log(&path, keypair, limits, &category, &message, out).await
        }
        Command::Get { id } => get(&ledger_path(ledger)?, id, out).await,
        Command::Count => count(&ledger_path(ledger)?, out).await,
        Command::List { from, to } => list(&ledger_path(ledger)?, from, to, out).await,
        Command::Confirm { receipt } => confirm(&ledger_path(ledger)?, &receipt, out).await,
    }
}

fn ledger_path(ledger: Option<PathBuf>) -> Result<PathBuf> {
    ledger.ok_or_else(|| anyhow!("no ledger given: pass --ledger or set DECISION_LEDGER"))
}

fn load_key(key: Option<&str>) -> Result<Keypair> {
    let key = key.ok_or_else(|| {
        anyhow!("no author key given: pass --key or set DECISION_LEDGER_KEY")
    })?;
    Keypair::from_hex_seed(key.trim()).context("invalid author key")
}

fn parse_writers(allow: &[String]) -> Result<Option<Vec<Author>>> {
    if allow.is_empty() {
        return Ok(None);
    }
    let authors = allow
        .iter()
        .map(|hex| {
            Author::from_hex(hex.trim())
                .with_context(|| format!("invalid --allow key {hex:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(authors))
}

/// Open a deployed ledger with a read-only caller context.
fn open_ledger(path: &Path) -> Result<Ledger<SqliteStore>> {
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;
    // Queries never consult identity or time; any key will do.
    let context = SystemContext::new(Keypair::generate());
    Ok(Ledger::new(
        store,
        Arc::new(context),
        Arc::new(NullNotifier::new()),
        LedgerConfig::default(),
    ))
}

fn write_line(out: &mut dyn Write, value: &serde_json::Value) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn keygen(out: &mut dyn Write) -> Result<()> {
    let keypair = Keypair::generate();
    write_line(
        out,
        &json!({
            "seed": hex::encode(keypair.seed()),
            "author": keypair.author().to_hex(),
        }),
    )
}

fn deploy(path: &Path, writers: Option<&[Author]>, out: &mut dyn Write) -> Result<()> {
    let store = match writers {
        Some(writers) => SqliteStore::create_restricted(path, writers),
        None => SqliteStore::create(path),
    }
    .with_context(|| format!("failed to deploy ledger at {}", path.display()))?;
    debug!(path = %path.display(), "ledger deployed");

    let writers = store
        .writers()
        .map(|w| w.iter().map(Author::to_hex).collect::<Vec<_>>());
    write_line(
        out,
        &json!({
            "ledger": path.display().to_string(),
            "ledger_id": store.ledger_id().to_hex(),
            "writers": writers,
        }),
    )
}

async fn log(
    path: &Path,
    keypair: Keypair,
    limits: EntryLimits,
    category: &str,
    message: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;
    let allow = store.writers().map(|w| AllowList::new(w.iter().copied()));
    let mut ledger = Ledger::new(
        store,
        Arc::new(SystemContext::new(keypair)),
        Arc::new(NullNotifier::new()),
        LedgerConfig::default().with_limits(limits),
    );
    if let Some(allow) = allow {
        ledger = ledger.with_policy(Arc::new(allow));
    }

    let outcome = ledger.log_decision(category, message).await?;
    write_line(
        out,
        &json!({
            "sequence_id": outcome.sequence_id,
            "receipt": outcome.receipt.to_hex(),
            "event": outcome.event,
        }),
    )
}

async fn get(path: &Path, id: u64, out: &mut dyn Write) -> Result<()> {
    let ledger = open_ledger(path)?;
    let record = ledger.get_record(SequenceId(id)).await?;
    write_line(out, &serde_json::to_value(&record)?)
}

async fn count(path: &Path, out: &mut dyn Write) -> Result<()> {
    let ledger = open_ledger(path)?;
    let count = ledger.record_count().await?;
    write_line(out, &json!({ "count": count }))
}

async fn list(path: &Path, from: u64, to: u64, out: &mut dyn Write) -> Result<()> {
    let ledger = open_ledger(path)?;
    let mut cursor = ledger.list_records(from, to).await?;
    while let Some(record) = cursor.next().await? {
        write_line(out, &serde_json::to_value(&record)?)?;
    }
    Ok(())
}

async fn confirm(path: &Path, receipt: &str, out: &mut dyn Write) -> Result<()> {
    let receipt = OperationReceipt::from_hex(receipt.trim()).context("invalid receipt")?;
    let ledger = open_ledger(path)?;
    let sequence_id = ledger.confirm_receipt(&receipt).await?;
    write_line(
        out,
        &json!({ "receipt": receipt.to_hex(), "sequence_id": sequence_id }),
    )
}
