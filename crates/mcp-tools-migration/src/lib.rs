// mcp-tools-migration/src/lib.rs
// ============================================================================
// Module: MCP Tools Migration Library
// Description: Content import, validation, and export.
// Purpose: Bulk content movement behind the governance pipeline.
// Dependencies: mcp-tools-core, serde, serde_json, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! `mcp-tools-migration` turns untyped JSON or CSV items into content records
//! and back. Protected fields are stripped from every import payload, and
//! progress of the most recent import is kept in the shared state store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod content;
pub mod csv;
pub mod normalize;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use content::ContentRecord;
pub use content::ContentSeed;
pub use content::ContentStore;
pub use content::ContentStoreError;
pub use content::ContentType;
pub use content::FieldDefinition;
pub use content::InMemoryContentStore;
pub use content::NewContent;
pub use normalize::ImportItem;
pub use service::CsvExport;
pub use service::FieldMappingReport;
pub use service::ImportReport;
pub use service::ImportStatusReport;
pub use service::JsonExport;
pub use service::MAX_EXPORT_ITEMS;
pub use service::MAX_IMPORT_ITEMS;
pub use service::MigrationError;
pub use service::MigrationService;
pub use service::SearchResults;
pub use service::ValidationReport;
