// mcp-tools-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite State Store
// Description: Durable StateStore backend using SQLite WAL.
// Purpose: Persist rate-limit windows and import status across restarts.
// Dependencies: mcp-tools-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`mcp_tools_core::StateStore`]. Each
//! rate-limit acquisition runs inside one transaction so concurrent servers
//! sharing a database file never over-admit.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStateStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
