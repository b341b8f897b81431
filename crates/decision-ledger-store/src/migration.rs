//! Versioned schema for the SQLite ledger.
//!
//! Version N+1 is applied on top of version N inside one transaction, and
//! each applied version is recorded in `schema_migrations`. A ledger file
//! written by a newer build is refused rather than downgraded.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = 1;

/// Bring the ledger schema up to [`CURRENT_VERSION`]. Safe to repeat.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "ledger schema v{current} was written by a newer build (this build supports v{CURRENT_VERSION})"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            info!(version, "ledger schema upgraded");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        other => Err(StoreError::Migration(format!("no migration to schema v{other}"))),
    }
}

/// v1: ledger identity plus the decisions table.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Ledger identity, written once at deployment
        CREATE TABLE ledger_meta (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );

        -- Committed decision records; seq is the gapless sequence id
        CREATE TABLE decisions (
            seq INTEGER PRIMARY KEY,           -- 0-based, assigned at commit
            category TEXT NOT NULL,
            message TEXT NOT NULL,
            author BLOB NOT NULL,              -- 32 bytes, Ed25519 public key
            recorded_at INTEGER NOT NULL,      -- logical commit time (Unix ms)
            receipt BLOB NOT NULL UNIQUE,      -- 32 bytes, operation receipt
            committed_at INTEGER NOT NULL      -- local wall-clock time of insert
        );

        CREATE INDEX idx_decisions_author ON decisions(author);
        CREATE INDEX idx_decisions_category ON decisions(category);
        "#,
    )?;

    Ok(())
}

/// Wall-clock Unix milliseconds, for bookkeeping columns only.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
