// mcp-tools-core/src/interfaces/mod.rs
// ============================================================================
// Module: MCP Tools Interfaces
// Description: Backend-agnostic interfaces for state, time, and auditing.
// Purpose: Define the contract surfaces used by the governance runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the governance layer integrates with persistence and
//! time without embedding backend details. Store implementations must apply
//! an acquisition atomically: every counter is checked and, only when all
//! pass, every counter is incremented inside one critical section.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::import_status::ImportStatus;
use crate::core::window::WindowDenial;
use crate::core::window::WindowLimit;
use crate::core::window::WindowState;

// ============================================================================
// SECTION: State Store
// ============================================================================

/// State store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("state store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("state store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("state store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("state store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("state store error: {0}")]
    Store(String),
}

/// Result of an atomic counter acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Every counter passed and was incremented.
    Granted,
    /// A counter was exhausted; nothing was incremented.
    Denied(WindowDenial),
}

/// Persistence for rate-limit windows and the import status slot.
pub trait StateStore {
    /// Checks and increments every counter in `limits` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read or written.
    fn acquire(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<AcquireOutcome, StoreError>;

    /// Increments every counter in `limits` without checking limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    fn record(&self, client_key: &str, limits: &[WindowLimit], now: u64) -> Result<(), StoreError>;

    /// Loads a single counter by storage name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn load_window(&self, client_key: &str, counter: &str)
    -> Result<Option<WindowState>, StoreError>;

    /// Removes the named counters for a client; other counters are kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    fn reset_counters(&self, client_key: &str, counters: &[String]) -> Result<(), StoreError>;

    /// Loads the most recent import status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn load_import_status(&self) -> Result<Option<ImportStatus>, StoreError>;

    /// Overwrites the import status slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    fn save_import_status(&self, status: &ImportStatus) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source for fixed windows and timestamps.
pub trait Clock {
    /// Returns the current unix time in seconds.
    fn now_unix_secs(&self) -> u64;

    /// Returns the current unix time in milliseconds.
    fn now_unix_millis(&self) -> u128 {
        u128::from(self.now_unix_secs()) * 1_000
    }
}
