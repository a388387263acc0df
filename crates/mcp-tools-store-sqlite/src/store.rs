// mcp-tools-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite State Store
// Description: Durable StateStore backed by SQLite WAL.
// Purpose: Persist fixed-window counters and the import status slot.
// Dependencies: mcp-tools-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Counters live in `rate_windows`, keyed by `(client_key, counter)`. Each
//! acquisition opens an immediate transaction, loads the counters it needs,
//! plans the outcome with [`plan_acquire`], and writes the new states before
//! committing. The same transaction deletes rows whose window started at
//! least [`MAX_WINDOW_SECS`] ago. The import status slot is a single JSON row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use mcp_tools_core::AcquireOutcome;
use mcp_tools_core::ImportStatus;
use mcp_tools_core::MAX_WINDOW_SECS;
use mcp_tools_core::StateStore;
use mcp_tools_core::StoreError;
use mcp_tools_core::WindowLimit;
use mcp_tools_core::WindowState;
use mcp_tools_core::plan_acquire;
use mcp_tools_core::plan_record;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum import status payload size accepted by the store.
const MAX_STATUS_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` state store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config with default pragmas for a path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error to a store error.
fn db_err(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed state store with WAL support.
#[derive(Clone)]
pub struct SqliteStateStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStateStore {
    /// Opens an `SQLite`-backed state store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `body` inside an immediate transaction.
    fn with_tx<T>(
        &self,
        body: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(|err| db_err(&err))?;
        let value = body(&tx)?;
        tx.commit().map_err(|err| db_err(&err))?;
        drop(guard);
        Ok(value)
    }

    /// Checks and applies an acquisition.
    fn acquire_windows(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<AcquireOutcome, SqliteStoreError> {
        self.with_tx(|tx| {
            purge_expired(tx, now)?;
            let current = load_windows(tx, client_key, limits)?;
            match plan_acquire(&current, limits, now) {
                Ok(states) => {
                    store_windows(tx, client_key, limits, &states)?;
                    Ok(AcquireOutcome::Granted)
                }
                Err(denial) => Ok(AcquireOutcome::Denied(denial)),
            }
        })
    }

    /// Records windows without checking limits.
    fn record_windows(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<(), SqliteStoreError> {
        self.with_tx(|tx| {
            purge_expired(tx, now)?;
            let current = load_windows(tx, client_key, limits)?;
            let states = plan_record(&current, limits, now);
            store_windows(tx, client_key, limits, &states)
        })
    }

    /// Loads a single window.
    fn load_single(
        &self,
        client_key: &str,
        counter: &str,
    ) -> Result<Option<WindowState>, SqliteStoreError> {
        self.with_tx(|tx| load_window(tx, client_key, counter))
    }

    /// Deletes the named windows for a client.
    fn delete_counters(&self, client_key: &str, counters: &[String]) -> Result<(), SqliteStoreError> {
        self.with_tx(|tx| {
            for counter in counters {
                tx.execute(
                    "DELETE FROM rate_windows WHERE client_key = ?1 AND counter = ?2",
                    params![client_key, counter],
                )
                .map_err(|err| db_err(&err))?;
            }
            Ok(())
        })
    }

    /// Loads the import status slot.
    fn load_status(&self) -> Result<Option<ImportStatus>, SqliteStoreError> {
        let bytes: Option<Vec<u8>> = self.with_tx(|tx| {
            tx.query_row("SELECT status_json FROM import_status WHERE slot = 1", params![], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| db_err(&err))
        })?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        if bytes.len() > MAX_STATUS_BYTES {
            return Err(SqliteStoreError::Invalid("import status exceeds size limit".to_string()));
        }
        let status: ImportStatus =
            serde_json::from_slice(&bytes).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
        Ok(Some(status))
    }

    /// Overwrites the import status slot.
    fn save_status(&self, status: &ImportStatus) -> Result<(), SqliteStoreError> {
        let bytes =
            serde_json::to_vec(status).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let saved_at = unix_millis();
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO import_status (slot, status_json, saved_at) VALUES (1, ?1, ?2) ON \
                 CONFLICT(slot) DO UPDATE SET status_json = excluded.status_json, saved_at = \
                 excluded.saved_at",
                params![bytes, saved_at],
            )
            .map_err(|err| db_err(&err))?;
            Ok(())
        })
    }
}

impl StateStore for SqliteStateStore {
    fn acquire(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<AcquireOutcome, StoreError> {
        self.acquire_windows(client_key, limits, now).map_err(StoreError::from)
    }

    fn record(&self, client_key: &str, limits: &[WindowLimit], now: u64) -> Result<(), StoreError> {
        self.record_windows(client_key, limits, now).map_err(StoreError::from)
    }

    fn load_window(
        &self,
        client_key: &str,
        counter: &str,
    ) -> Result<Option<WindowState>, StoreError> {
        self.load_single(client_key, counter).map_err(StoreError::from)
    }

    fn reset_counters(&self, client_key: &str, counters: &[String]) -> Result<(), StoreError> {
        self.delete_counters(client_key, counters).map_err(StoreError::from)
    }

    fn load_import_status(&self) -> Result<Option<ImportStatus>, StoreError> {
        self.load_status().map_err(StoreError::from)
    }

    fn save_import_status(&self, status: &ImportStatus) -> Result<(), StoreError> {
        self.save_status(status).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads the current state of every limit's counter.
fn load_windows(
    tx: &Transaction<'_>,
    client_key: &str,
    limits: &[WindowLimit],
) -> Result<Vec<Option<WindowState>>, SqliteStoreError> {
    limits.iter().map(|limit| load_window(tx, client_key, &limit.counter())).collect()
}

/// Loads one counter row.
fn load_window(
    tx: &Transaction<'_>,
    client_key: &str,
    counter: &str,
) -> Result<Option<WindowState>, SqliteStoreError> {
    let row: Option<(i64, i64)> = tx
        .query_row(
            "SELECT count, window_start FROM rate_windows WHERE client_key = ?1 AND counter = ?2",
            params![client_key, counter],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| db_err(&err))?;
    let Some((count, window_start)) = row else {
        return Ok(None);
    };
    let count = u64::try_from(count)
        .map_err(|_| SqliteStoreError::Corrupt(format!("negative count for counter {counter}")))?;
    let window_start = u64::try_from(window_start).map_err(|_| {
        SqliteStoreError::Corrupt(format!("negative window_start for counter {counter}"))
    })?;
    Ok(Some(WindowState {
        count,
        window_start,
    }))
}

/// Deletes counter rows that are expired for every window size.
fn purge_expired(tx: &Transaction<'_>, now: u64) -> Result<(), SqliteStoreError> {
    let Some(cutoff) = now.checked_sub(MAX_WINDOW_SECS) else {
        return Ok(());
    };
    let cutoff = i64::try_from(cutoff)
        .map_err(|_| SqliteStoreError::Invalid("window cutoff exceeds i64".to_string()))?;
    tx.execute("DELETE FROM rate_windows WHERE window_start <= ?1", params![cutoff])
        .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Upserts counter rows.
fn store_windows(
    tx: &Transaction<'_>,
    client_key: &str,
    limits: &[WindowLimit],
    states: &[WindowState],
) -> Result<(), SqliteStoreError> {
    for (limit, state) in limits.iter().zip(states) {
        let count = i64::try_from(state.count)
            .map_err(|_| SqliteStoreError::Invalid("count exceeds i64".to_string()))?;
        let window_start = i64::try_from(state.window_start)
            .map_err(|_| SqliteStoreError::Invalid("window_start exceeds i64".to_string()))?;
        tx.execute(
            "INSERT INTO rate_windows (client_key, counter, count, window_start) VALUES (?1, ?2, \
             ?3, ?4) ON CONFLICT(client_key, counter) DO UPDATE SET count = excluded.count, \
             window_start = excluded.window_start",
            params![client_key, limit.counter(), count, window_start],
        )
        .map_err(|err| db_err(&err))?;
    }
    Ok(())
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| db_err(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_err(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_err(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_err(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_err(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS rate_windows (
                    client_key TEXT NOT NULL,
                    counter TEXT NOT NULL,
                    count INTEGER NOT NULL,
                    window_start INTEGER NOT NULL,
                    PRIMARY KEY (client_key, counter)
                );
                CREATE TABLE IF NOT EXISTS import_status (
                    slot INTEGER PRIMARY KEY CHECK (slot = 1),
                    status_json BLOB NOT NULL,
                    saved_at INTEGER NOT NULL
                );",
            )
            .map_err(|err| db_err(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS rate_windows_window_start ON rate_windows (window_start);",
    )
    .map_err(|err| db_err(&err))?;
    tx.commit().map_err(|err| db_err(&err))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
