// mcp-tools-core/src/core/import_status.rs
// ============================================================================
// Module: Import Status
// Description: Progress record for the most recent content import.
// Purpose: Share the single import-status slot between services and stores.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Only the latest import is tracked; starting a new import overwrites the
//! slot. Stores persist the record as-is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle state of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    /// Items are still being processed.
    InProgress,
    /// Every item reached a terminal state.
    Completed,
    /// The import aborted on a store-level error.
    Failed,
}

/// Progress of the most recent import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatus {
    /// Random import identifier.
    pub import_id: String,
    /// Lifecycle state.
    pub status: ImportState,
    /// Items submitted.
    pub total_items: u64,
    /// Items created so far.
    pub processed: u64,
    /// Items that failed so far.
    pub failed: u64,
    /// Start time in unix seconds.
    pub started_at: u64,
    /// Last update in unix seconds.
    pub updated_at: u64,
}

impl ImportStatus {
    /// Starts tracking a new import.
    #[must_use]
    pub fn start(import_id: impl Into<String>, total_items: u64, now: u64) -> Self {
        Self {
            import_id: import_id.into(),
            status: ImportState::InProgress,
            total_items,
            processed: 0,
            failed: 0,
            started_at: now,
            updated_at: now,
        }
    }
}
