//! SQLite implementation of the RecordStore trait.
//!
//! This is the persistent backend for the decision ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use decision_ledger_core::{
    compute_receipt, Author, DecisionRecord, LedgerId, NewRecord, OperationReceipt, SequenceId,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{clamp_range, Committed, RecordStore};

const LEDGER_ID_KEY: &str = "ledger_id";

/// Concatenated 32-byte public keys; absent when anyone may append.
const WRITERS_KEY: &str = "writers";

const RECORD_COLUMNS: &str = "seq, category, message, author, recorded_at";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime, and every append runs inside a
/// single transaction.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    /// Read once at open; never changes afterwards.
    ledger_id: LedgerId,
    /// Authors fixed at deployment, if the ledger was restricted.
    writers: Option<Vec<Author>>,
}

impl SqliteStore {
    /// Deploy a new, empty ledger at `path`.
    ///
    /// Fails with `AlreadyExists` if anything is already at that path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::deploy_with(path, |conn| {
            Self::init(conn, Some(LedgerId::generate()), path)
        })?;
        info!(ledger_id = %store.ledger_id, path = %path.display(), "deployed ledger");
        Ok(store)
    }

    /// Deploy a new ledger that only `writers` may append to.
    ///
    /// The list is stored with the ledger and cannot be changed later.
    pub fn create_restricted(path: impl AsRef<Path>, writers: &[Author]) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::deploy_with(path, |conn| {
            let mut store = Self::init(conn, Some(LedgerId::generate()), path)?;
            store.store_writers(writers)?;
            Ok(store)
        })?;
        info!(
            ledger_id = %store.ledger_id,
            path = %path.display(),
            writers = writers.len(),
            "deployed restricted ledger"
        );
        Ok(store)
    }

    /// Claim `path` exclusively, then initialize it with `init`.
    ///
    /// The file is removed again if `init` fails, so a failed deploy can be
    /// retried at the same path.
    fn deploy_with<F>(path: &Path, init: F) -> Result<Self>
    where
        F: FnOnce(Connection) -> Result<Self>,
    {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(path.to_path_buf()),
                _ => StoreError::Io(e),
            })?;

        let deployed = Connection::open(path)
            .map_err(StoreError::from)
            .and_then(init);
        if let Err(e) = &deployed {
            warn!(path = %path.display(), error = %e, "deploy failed; removing ledger file");
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "could not remove ledger file");
            }
        }
        deployed
    }

    /// Open a ledger previously deployed with [`SqliteStore::create`].
    ///
    /// Fails with `NotDeployed` if there is no ledger at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotDeployed(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Self::init(conn, None, path)
    }

    /// Open an in-memory SQLite ledger.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, Some(LedgerId::generate()), Path::new(":memory:"))
    }

    fn init(mut conn: Connection, deploy: Option<LedgerId>, path: &Path) -> Result<Self> {
        // Opening must not turn an unrelated database into a ledger.
        if deploy.is_none() {
            let deployed: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'ledger_meta')",
                [],
                |row| row.get(0),
            )?;
            if !deployed {
                return Err(StoreError::NotDeployed(path.to_path_buf()));
            }
        }

        migration::migrate(&mut conn)?;

        let stored: Option<Vec<u8>> = conn
            .query_row(
                "SELECT value FROM ledger_meta WHERE key = ?1",
                params![LEDGER_ID_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let ledger_id = match (stored, deploy) {
            (Some(bytes), _) => LedgerId::try_from(bytes.as_slice())
                .map_err(|_| StoreError::InvalidData("ledger id is not 32 bytes".into()))?,
            (None, Some(id)) => {
                conn.execute(
                    "INSERT INTO ledger_meta (key, value) VALUES (?1, ?2)",
                    params![LEDGER_ID_KEY, id.as_bytes().as_slice()],
                )?;
                id
            }
            (None, None) => return Err(StoreError::NotDeployed(path.to_path_buf())),
        };

        let writers: Option<Vec<u8>> = conn
            .query_row(
                "SELECT value FROM ledger_meta WHERE key = ?1",
                params![WRITERS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let writers = writers.map(|bytes| decode_writers(&bytes)).transpose()?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ledger_id,
            writers,
        })
    }

    fn store_writers(&mut self, writers: &[Author]) -> Result<()> {
        let bytes: Vec<u8> = writers.iter().flat_map(|a| *a.as_bytes()).collect();
        {
            let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            conn.execute(
                "INSERT INTO ledger_meta (key, value) VALUES (?1, ?2)",
                params![WRITERS_KEY, bytes],
            )?;
        }
        self.writers = Some(writers.to_vec());
        Ok(())
    }

    /// Authors allowed to append, or `None` if the ledger is open to anyone.
    pub fn writers(&self) -> Option<&[Author]> {
        self.writers.as_deref()
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn run_blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn decode_writers(bytes: &[u8]) -> Result<Vec<Author>> {
    let chunks = bytes.chunks_exact(32);
    if !chunks.remainder().is_empty() {
        return Err(StoreError::InvalidData(
            "writer list is not a multiple of 32 bytes".into(),
        ));
    }
    Ok(chunks
        .map(|chunk| {
            let mut key = [0u8; 32];
            key.copy_from_slice(chunk);
            Author(key)
        })
        .collect())
}

/// Next sequence id. `seq` is the rowid, so this is an index lookup.
fn next_seq(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(seq) + 1, 0) FROM decisions",
        [],
        |row| row.get(0),
    )
}

// Helper to convert a row to a DecisionRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DecisionRecord> {
    let seq: i64 = row.get("seq")?;
    let author_bytes: Vec<u8> = row.get("author")?;
    let recorded_at: i64 = row.get("recorded_at")?;

    let author: [u8; 32] = author_bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(3, "author".into(), rusqlite::types::Type::Blob)
    })?;

    let entry = NewRecord::new(
        row.get::<_, String>("category")?,
        row.get::<_, String>("message")?,
        Author(author),
        recorded_at as u64,
    );
    Ok(entry.into_record(SequenceId(seq as u64)))
}

/// SQLite integers are signed; values past i64::MAX cannot be stored.
fn to_sql_int(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("{what} out of range")))
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn ledger_id(&self) -> LedgerId {
        self.ledger_id
    }

    async fn count(&self) -> Result<u64> {
        self.run_blocking(|conn| Ok(next_seq(conn)? as u64))
        .await
    }

    async fn get(&self, sequence_id: SequenceId) -> Result<DecisionRecord> {
        self.run_blocking(move |conn| {
            let Ok(seq) = i64::try_from(sequence_id.value()) else {
                return Err(StoreError::NotFound(sequence_id));
            };
            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM decisions WHERE seq = ?1"),
                params![seq],
                row_to_record,
            )
            .optional()?
            .ok_or(StoreError::NotFound(sequence_id))
        })
        .await
    }

    async fn range(&self, from: u64, to: u64) -> Result<Vec<DecisionRecord>> {
        self.run_blocking(move |conn| {
            let (start, end) = clamp_range(from, to, next_seq(conn)? as u64);

            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM decisions WHERE seq >= ?1 AND seq < ?2 ORDER BY seq"
            ))?;
            let records = stmt
                .query_map(params![start as i64, end as i64], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn last(&self) -> Result<Option<DecisionRecord>> {
        self.run_blocking(|conn| {
            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM decisions ORDER BY seq DESC LIMIT 1"),
                [],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn sequence_for_receipt(
        &self,
        receipt: &OperationReceipt,
    ) -> Result<Option<SequenceId>> {
        let receipt = *receipt;
        self.run_blocking(move |conn| {
            let seq: Option<i64> = conn
                .query_row(
                    "SELECT seq FROM decisions WHERE receipt = ?1",
                    params![receipt.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(seq.map(|s| SequenceId(s as u64)))
        })
        .await
    }

    async fn append_internal(&self, entry: NewRecord) -> Result<Committed> {
        let ledger_id = self.ledger_id;

        let committed = self
            .run_blocking(move |conn| {
                let tx = conn.transaction()?;

                let seq = next_seq(&tx)?;
                let previous: Option<i64> = tx
                    .query_row(
                        "SELECT recorded_at FROM decisions ORDER BY seq DESC LIMIT 1",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;

                if let Some(previous) = previous.map(|p| p as u64) {
                    if entry.recorded_at < previous {
                        return Err(StoreError::TimestampRegression {
                            previous,
                            attempted: entry.recorded_at,
                        });
                    }
                }

                let recorded_at = to_sql_int(entry.recorded_at, "recorded_at")?;
                let record = entry.into_record(SequenceId(seq as u64));
                let receipt = compute_receipt(&ledger_id, &record)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;

                tx.execute(
                    "INSERT INTO decisions (
                        seq, category, message, author, recorded_at, receipt, committed_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        seq,
                        record.category(),
                        record.message(),
                        record.author().as_bytes().as_slice(),
                        recorded_at,
                        receipt.as_bytes().as_slice(),
                        now_millis(),
                    ],
                )?;

                // Dropping `tx` on any earlier return rolls back.
                tx.commit()?;
                Ok(Committed { record, receipt })
            })
            .await?;

        debug!(
            seq = committed.record.sequence_id().value(),
            "sqlite store committed record"
        );
        Ok(committed)
    }
}
