// mcp-tools-migration/src/service.rs
// ============================================================================
// Module: Migration Service
// Description: Content import, validation, field mapping, and export.
// Purpose: Move content in and out of a site without touching protected data.
// Dependencies: mcp-tools-core, serde, serde_json, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! [`MigrationService`] imports batches of untyped items into a
//! [`ContentStore`], reports what would happen before an import runs, and
//! exports existing content as CSV or JSON. Each import records progress in
//! the single import status slot of the [`StateStore`].
//!
//! ## Invariants
//! - Batches above [`MAX_IMPORT_ITEMS`] are rejected before any item is
//!   processed.
//! - One item's failure never aborts the batch; only store-level failures do.
//! - Protected fields are dropped from every payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use mcp_tools_core::Actor;
use mcp_tools_core::Clock;
use mcp_tools_core::ErrorCode;
use mcp_tools_core::ImportState;
use mcp_tools_core::ImportStatus;
use mcp_tools_core::ProtectedFieldFilter;
use mcp_tools_core::StateStore;
use mcp_tools_core::wrap_error;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use uuid::Uuid;

use crate::content::ContentRecord;
use crate::content::ContentStore;
use crate::content::ContentStoreError;
use crate::content::ContentType;
use crate::content::NewContent;
use crate::csv;
use crate::normalize::ImportItem;
use crate::normalize::TitleOutcome;
use crate::normalize::build_field_payload;
use crate::normalize::extract_status;
use crate::normalize::extract_title;
use crate::normalize::truthy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum items accepted by one import call.
pub const MAX_IMPORT_ITEMS: usize = 100;
/// Maximum items returned by one export call.
pub const MAX_EXPORT_ITEMS: usize = 100;
/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
/// Maximum number of search results.
pub const MAX_SEARCH_LIMIT: usize = 100;
/// Timestamp layout of the CSV `created` column.
const CSV_DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Base fields managed by the site and never offered for mapping.
const AUTO_MANAGED_FIELDS: &[&str] = &[
    "nid",
    "uuid",
    "vid",
    "langcode",
    "type",
    "revision_timestamp",
    "revision_uid",
    "revision_log",
    "status",
    "uid",
    "title",
    "created",
    "changed",
    "promote",
    "sticky",
    "default_langcode",
    "revision_default",
    "revision_translation_affected",
    "path",
    "menu_link",
    "content_translation_source",
    "content_translation_outdated",
];

/// Leading CSV export columns.
const CSV_BASE_COLUMNS: [&str; 4] = ["nid", "title", "status", "created"];

/// Message for rows whose title key is present but blank.
const TITLE_REQUIRED: &str = "Title (or name) is required.";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Migration service errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Content type or record does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Request input is unacceptable.
    #[error("{0}")]
    Validation(String),
    /// A backing store failed.
    #[error("{0}")]
    Store(String),
}

impl MigrationError {
    /// Returns the envelope error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Store(_) => ErrorCode::ExecutionFailed,
        }
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Successfully created row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedItem {
    /// Assigned node id.
    pub nid: u64,
    /// Stored title.
    pub title: String,
    /// 1-based source row.
    pub row: usize,
}

/// Failed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    /// 1-based source row.
    pub row: usize,
    /// Failure reason.
    pub error: String,
    /// Title when one was extracted, otherwise `Unknown`.
    pub title: String,
}

/// Validation finding for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// 1-based source row.
    pub row: usize,
    /// Field the finding concerns.
    pub field: String,
    /// Human-readable finding.
    pub message: String,
}

/// Result of an import call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Import identifier.
    pub import_id: String,
    /// Target bundle.
    pub content_type: String,
    /// Items submitted.
    pub total_items: usize,
    /// Items created.
    pub created_count: usize,
    /// Items failed.
    pub failed_count: usize,
    /// Created rows.
    pub created: Vec<CreatedItem>,
    /// Failed rows.
    pub failed: Vec<FailedItem>,
    /// Non-blocking findings from pre-import validation.
    pub warnings: Vec<ValidationIssue>,
    /// Summary line.
    pub message: String,
}

/// Result of a validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True when no errors were found.
    pub valid: bool,
    /// Items checked.
    pub total_items: usize,
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Row errors.
    pub errors: Vec<ValidationIssue>,
    /// Row warnings.
    pub warnings: Vec<ValidationIssue>,
}

/// Importable field description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    /// Human label.
    pub label: String,
    /// Storage type name.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Help text.
    pub description: String,
    /// Allowed values for list fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Value>,
}

/// Importable fields of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMappingReport {
    /// Bundle machine name.
    pub content_type: String,
    /// Bundle label.
    pub label: String,
    /// Required fields keyed by name; always includes `title`.
    pub required: BTreeMap<String, FieldInfo>,
    /// Optional fields keyed by name.
    pub optional: BTreeMap<String, FieldInfo>,
}

/// CSV export result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    /// Bundle machine name.
    pub content_type: String,
    /// Rows exported.
    pub exported_count: usize,
    /// Column names.
    pub fields: Vec<String>,
    /// CSV text, header first.
    pub csv_data: String,
    /// Summary line.
    pub message: String,
}

/// JSON export result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonExport {
    /// Bundle machine name.
    pub content_type: String,
    /// Items exported.
    pub exported_count: usize,
    /// Exported items.
    pub items: Vec<Value>,
    /// Summary line.
    pub message: String,
}

/// Search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Node id.
    pub nid: u64,
    /// Title.
    pub title: String,
    /// Bundle machine name.
    pub content_type: String,
    /// Published flag as 0/1.
    pub status: u8,
}

/// Search result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    /// Query as submitted.
    pub query: String,
    /// Total matches before the limit.
    pub total: usize,
    /// Returned hits.
    pub items: Vec<SearchHit>,
}

/// Import status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImportStatusReport {
    /// A previous import exists.
    Found {
        /// Always true.
        has_import: bool,
        /// Import identifier.
        import_id: String,
        /// Lifecycle state.
        status: ImportState,
        /// Items submitted.
        total_items: u64,
        /// Items created.
        processed: u64,
        /// Items failed.
        failed: u64,
        /// Start time (RFC 3339).
        started_at: String,
        /// Last update time (RFC 3339).
        updated_at: String,
    },
    /// No import has run.
    Missing {
        /// Always false.
        has_import: bool,
        /// Explanation.
        message: String,
    },
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Content migration service.
#[derive(Clone)]
pub struct MigrationService {
    /// Entity storage.
    content: Arc<dyn ContentStore + Send + Sync>,
    /// Import status slot.
    state: Arc<dyn StateStore + Send + Sync>,
    /// Protected field blocklist.
    filter: Arc<ProtectedFieldFilter>,
    /// Time source.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl MigrationService {
    /// Builds a migration service.
    #[must_use]
    pub fn new(
        content: Arc<dyn ContentStore + Send + Sync>,
        state: Arc<dyn StateStore + Send + Sync>,
        filter: Arc<ProtectedFieldFilter>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            content,
            state,
            filter,
            clock,
        }
    }

    /// Returns the protected field filter used for imports.
    #[must_use]
    pub fn protected_fields(&self) -> &ProtectedFieldFilter {
        &self.filter
    }

    /// Imports items as new records of `content_type`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NotFound`] for an unknown content type,
    /// [`MigrationError::Validation`] for oversized batches, and
    /// [`MigrationError::Store`] when a store fails mid-import.
    pub fn import_from_json(
        &self,
        content_type: &str,
        items: &[ImportItem],
        actor: &Actor,
    ) -> Result<ImportReport, MigrationError> {
        let bundle = self.require_type(content_type)?;
        check_batch_size(items.len())?;
        let validation = self.validate_items(&bundle, items);

        let import_id = new_import_id();
        let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let mut status = ImportStatus::start(import_id.clone(), total, self.clock.now_unix_secs());
        self.save_status(&status)?;

        let mut created = Vec::new();
        let mut failed = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let row = index + 1;
            match self.import_item(&bundle, item, row, actor) {
                Ok(record) => {
                    created.push(CreatedItem {
                        nid: record.nid,
                        title: record.title,
                        row,
                    });
                    status.processed = status.processed.saturating_add(1);
                    status.updated_at = self.clock.now_unix_secs();
                    if let Err(err) = self.save_status(&status) {
                        return Err(self.abort_import(status, &err));
                    }
                }
                Err(ItemFailure::Row(failure)) => {
                    status.failed = status.failed.saturating_add(1);
                    failed.push(failure);
                }
                Err(ItemFailure::Store(err)) => return Err(self.abort_import(status, &err)),
            }
        }

        status.status = ImportState::Completed;
        status.updated_at = self.clock.now_unix_secs();
        self.save_status(&status)?;

        Ok(ImportReport {
            message: format!("Successfully imported {} of {} items.", created.len(), items.len()),
            import_id,
            content_type: content_type.to_string(),
            total_items: items.len(),
            created_count: created.len(),
            failed_count: failed.len(),
            created,
            failed,
            warnings: validation.warnings,
        })
    }

    /// Parses CSV text and imports the rows.
    ///
    /// The first record is the header. Header names are remapped through
    /// `field_mapping`; blank rows and rows whose cell count differs from
    /// the header are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Validation`] when the CSV has no data row,
    /// plus every error of [`MigrationService::import_from_json`].
    pub fn import_from_csv(
        &self,
        content_type: &str,
        csv_data: &str,
        field_mapping: &BTreeMap<String, String>,
        actor: &Actor,
    ) -> Result<ImportReport, MigrationError> {
        let items = parse_csv_items(csv_data, field_mapping)?;
        self.import_from_json(content_type, &items, actor)
    }

    /// Reports what an import of `items` would do.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NotFound`] for an unknown content type and
    /// [`MigrationError::Validation`] for oversized batches.
    pub fn validate_import(
        &self,
        content_type: &str,
        items: &[ImportItem],
    ) -> Result<ValidationReport, MigrationError> {
        let bundle = self.require_type(content_type)?;
        check_batch_size(items.len())?;
        Ok(self.validate_items(&bundle, items))
    }

    /// Lists the importable fields of a content type.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NotFound`] for an unknown content type.
    pub fn get_field_mapping(&self, content_type: &str) -> Result<FieldMappingReport, MigrationError> {
        let bundle = self.require_type(content_type)?;
        Ok(field_mapping(&bundle))
    }

    /// Exports up to `limit` records as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NotFound`] for an unknown content type and
    /// [`MigrationError::Store`] when the store fails.
    pub fn export_to_csv(&self, content_type: &str, limit: usize) -> Result<CsvExport, MigrationError> {
        let bundle = self.require_type(content_type)?;
        let records = self.list_records(content_type, limit)?;
        let mut columns: Vec<String> = CSV_BASE_COLUMNS.iter().map(ToString::to_string).collect();
        columns.extend(exportable_fields(&bundle).map(|field| field.name.clone()));

        let mut rows = Vec::with_capacity(records.len() + 1);
        rows.push(columns.iter().map(|column| csv::escape(column)).collect::<Vec<_>>().join(","));
        for record in &records {
            let mut cells = vec![
                record.nid.to_string(),
                csv::escape(&record.title),
                if record.status { "1" } else { "0" }.to_string(),
                format_datetime(record.created)?,
            ];
            for field in exportable_fields(&bundle) {
                let cell = csv_cell(&field.field_type, record.fields.get(&field.name));
                cells.push(csv::escape(&cell));
            }
            rows.push(cells.join(","));
        }

        Ok(CsvExport {
            message: format!("Exported {} items of type {content_type}.", records.len()),
            content_type: content_type.to_string(),
            exported_count: records.len(),
            fields: columns,
            csv_data: rows.join("\n"),
        })
    }

    /// Exports up to `limit` records as JSON items.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NotFound`] for an unknown content type and
    /// [`MigrationError::Store`] when the store fails.
    pub fn export_to_json(&self, content_type: &str, limit: usize) -> Result<JsonExport, MigrationError> {
        let bundle = self.require_type(content_type)?;
        let records = self.list_records(content_type, limit)?;
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let mut item = Map::new();
            item.insert("nid".to_string(), Value::from(record.nid));
            item.insert("uuid".to_string(), Value::String(record.uuid.clone()));
            item.insert("title".to_string(), Value::String(record.title.clone()));
            item.insert("status".to_string(), Value::from(u8::from(record.status)));
            item.insert("created".to_string(), Value::String(format_rfc3339(record.created)?));
            item.insert("changed".to_string(), Value::String(format_rfc3339(record.changed)?));
            for field in exportable_fields(&bundle) {
                let value = record.fields.get(&field.name).cloned().unwrap_or(Value::Null);
                item.insert(field.name.clone(), value);
            }
            items.push(Value::Object(item));
        }
        Ok(JsonExport {
            message: format!("Exported {} items of type {content_type}.", items.len()),
            content_type: content_type.to_string(),
            exported_count: items.len(),
            items,
        })
    }

    /// Searches record titles.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Validation`] for a blank query,
    /// [`MigrationError::NotFound`] for an unknown content type filter, and
    /// [`MigrationError::Store`] when the store fails.
    pub fn search_content(
        &self,
        query: &str,
        content_type: Option<&str>,
        limit: Option<usize>,
    ) -> Result<SearchResults, MigrationError> {
        if query.trim().is_empty() {
            return Err(MigrationError::Validation("Search query must not be empty.".to_string()));
        }
        if let Some(bundle) = content_type {
            self.require_type(bundle)?;
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);
        let matches = self
            .content
            .search_titles(query, content_type)
            .map_err(|err| MigrationError::Store(wrap_error("Search failed", err)))?;
        let items = matches
            .iter()
            .take(limit)
            .map(|record| SearchHit {
                nid: record.nid,
                title: record.title.clone(),
                content_type: record.content_type.clone(),
                status: u8::from(record.status),
            })
            .collect();
        Ok(SearchResults {
            query: query.to_string(),
            total: matches.len(),
            items,
        })
    }

    /// Reports the most recent import.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Store`] when the state store fails.
    pub fn get_import_status(&self) -> Result<ImportStatusReport, MigrationError> {
        let status = self
            .state
            .load_import_status()
            .map_err(|err| MigrationError::Store(wrap_error("Failed to load import status", err)))?;
        let Some(status) = status else {
            return Ok(ImportStatusReport::Missing {
                has_import: false,
                message: "No recent import found.".to_string(),
            });
        };
        Ok(ImportStatusReport::Found {
            has_import: true,
            import_id: status.import_id,
            status: status.status,
            total_items: status.total_items,
            processed: status.processed,
            failed: status.failed,
            started_at: format_rfc3339(status.started_at)?,
            updated_at: format_rfc3339(status.updated_at)?,
        })
    }

    /// Loads a content type or reports it missing.
    fn require_type(&self, content_type: &str) -> Result<ContentType, MigrationError> {
        self.content
            .content_type(content_type)
            .map_err(|err| MigrationError::Store(err.to_string()))?
            .ok_or_else(|| MigrationError::NotFound(format!("Content type '{content_type}' not found.")))
    }

    /// Lists records for export with the limit capped.
    fn list_records(&self, content_type: &str, limit: usize) -> Result<Vec<ContentRecord>, MigrationError> {
        self.content
            .list_by_type(content_type, limit.min(MAX_EXPORT_ITEMS))
            .map_err(|err| MigrationError::Store(wrap_error("Export failed", err)))
    }

    /// Normalizes and stores one item.
    fn import_item(
        &self,
        bundle: &ContentType,
        item: &ImportItem,
        row: usize,
        actor: &Actor,
    ) -> Result<ContentRecord, ItemFailure> {
        let title = match extract_title(item, row) {
            TitleOutcome::Present(title) | TitleOutcome::Placeholder(title) => title,
            TitleOutcome::Blank => {
                return Err(ItemFailure::Row(FailedItem {
                    row,
                    error: TITLE_REQUIRED.to_string(),
                    title: "Unknown".to_string(),
                }));
            }
        };
        let content = NewContent {
            content_type: bundle.id.clone(),
            title: title.clone(),
            status: extract_status(item),
            uid: actor.id.clone(),
            fields: build_field_payload(item, bundle, &self.filter),
        };
        match self.content.create(content, self.clock.now_unix_secs()) {
            Ok(record) => Ok(record),
            Err(ContentStoreError::Rejected(error)) => Err(ItemFailure::Row(FailedItem {
                row,
                error,
                title,
            })),
            Err(err) => Err(ItemFailure::Store(err.to_string())),
        }
    }

    /// Collects validation findings for a batch.
    fn validate_items(&self, bundle: &ContentType, items: &[ImportItem]) -> ValidationReport {
        let mapping = field_mapping(bundle);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let row = index + 1;
            match extract_title(item, row) {
                TitleOutcome::Blank => errors.push(issue(row, "title", TITLE_REQUIRED)),
                TitleOutcome::Placeholder(placeholder) => warnings.push(issue(
                    row,
                    "title",
                    &format!("No title provided; '{placeholder}' will be used."),
                )),
                TitleOutcome::Present(_) => {}
            }
            for field in mapping.required.keys().filter(|name| name.as_str() != "title") {
                let short = field.strip_prefix("field_").unwrap_or(field);
                let supplied = [field.as_str(), short]
                    .iter()
                    .any(|key| item.get(*key).is_some_and(|value| !value.is_null()));
                if !supplied {
                    warnings.push(issue(row, field, &format!("Required field '{field}' is missing.")));
                }
            }
            for name in item.keys() {
                if ["title", "name", "status"].contains(&name.as_str()) {
                    continue;
                }
                if self.filter.is_protected(name) {
                    warnings.push(issue(row, name, &format!("Protected field '{name}' will be ignored.")));
                    continue;
                }
                let prefixed =
                    if name.starts_with("field_") { name.clone() } else { format!("field_{name}") };
                let known = |key: &str| mapping.required.contains_key(key) || mapping.optional.contains_key(key);
                if !known(&prefixed) && !known(name) && name != "body" {
                    warnings.push(issue(row, name, &format!("Unknown field '{name}' will be ignored.")));
                }
            }
        }
        ValidationReport {
            valid: errors.is_empty(),
            total_items: items.len(),
            error_count: errors.len(),
            warning_count: warnings.len(),
            errors,
            warnings,
        }
    }

    /// Saves the import status slot.
    fn save_status(&self, status: &ImportStatus) -> Result<(), MigrationError> {
        self.state
            .save_import_status(status)
            .map_err(|err| MigrationError::Store(wrap_error("Import failed", err)))
    }

    /// Marks the import failed and builds the returned error.
    ///
    /// A failure to save the failed status is appended to the message.
    fn abort_import(&self, mut status: ImportStatus, cause: &dyn std::fmt::Display) -> MigrationError {
        status.status = ImportState::Failed;
        status.updated_at = self.clock.now_unix_secs();
        let mut message = cause.to_string();
        if !message.starts_with("Import failed") {
            message = wrap_error("Import failed", message);
        }
        if let Err(err) = self.state.save_import_status(&status) {
            message = format!("{message} (failed status not saved: {err})");
        }
        MigrationError::Store(message)
    }
}

/// Failure of a single import item.
enum ItemFailure {
    /// The row failed; the batch continues.
    Row(FailedItem),
    /// The store failed; the batch stops.
    Store(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects batches above the per-call ceiling.
fn check_batch_size(count: usize) -> Result<(), MigrationError> {
    if count > MAX_IMPORT_ITEMS {
        return Err(MigrationError::Validation(format!(
            "Import limited to {MAX_IMPORT_ITEMS} items per call. Received {count} items."
        )));
    }
    Ok(())
}

/// Parses CSV text into import items.
fn parse_csv_items(
    csv_data: &str,
    field_mapping: &BTreeMap<String, String>,
) -> Result<Vec<ImportItem>, MigrationError> {
    let records = csv::split_records(csv_data);
    if records.len() < 2 {
        return Err(MigrationError::Validation(
            "CSV must contain a header row and at least one data row.".to_string(),
        ));
    }
    let headers: Vec<String> = csv::parse_record(&records[0])
        .into_iter()
        .map(|header| {
            let header = header.trim().to_string();
            field_mapping.get(&header).cloned().unwrap_or(header)
        })
        .collect();
    let mut items = Vec::new();
    for record in records.iter().skip(1) {
        if record.trim().is_empty() {
            continue;
        }
        let values = csv::parse_record(record);
        if values.len() != headers.len() {
            continue;
        }
        let item: ImportItem =
            headers.iter().cloned().zip(values.into_iter().map(Value::String)).collect();
        items.push(item);
    }
    Ok(items)
}

/// Builds the field mapping report for a bundle.
fn field_mapping(bundle: &ContentType) -> FieldMappingReport {
    let mut required = BTreeMap::new();
    required.insert("title".to_string(), FieldInfo {
        label: "Title".to_string(),
        field_type: "string".to_string(),
        description: "The content title (required).".to_string(),
        allowed_values: None,
    });
    let mut optional = BTreeMap::new();
    for field in &bundle.fields {
        if AUTO_MANAGED_FIELDS.contains(&field.name.as_str()) {
            continue;
        }
        let info = FieldInfo {
            label: field.label.clone(),
            field_type: field.field_type.clone(),
            description: field
                .description
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| "No description available.".to_string()),
            allowed_values: field.allowed_values.clone(),
        };
        if field.required {
            required.insert(field.name.clone(), info);
        } else {
            optional.insert(field.name.clone(), info);
        }
    }
    FieldMappingReport {
        content_type: bundle.id.clone(),
        label: bundle.label.clone(),
        required,
        optional,
    }
}

/// Returns the bundle fields included in exports.
fn exportable_fields(bundle: &ContentType) -> impl Iterator<Item = &crate::content::FieldDefinition> {
    bundle.fields.iter().filter(|field| field.name.starts_with("field_") || field.name == "body")
}

/// Renders a stored field value as a single CSV cell.
fn csv_cell(field_type: &str, value: Option<&Value>) -> String {
    let first = match value {
        None => return String::new(),
        Some(Value::Array(items)) => match items.first() {
            Some(first) => first,
            None => return String::new(),
        },
        Some(other) => other,
    };
    let key = match field_type {
        "entity_reference" | "image" | "file" => "target_id",
        "link" => "uri",
        _ => "value",
    };
    let scalar = match first {
        Value::Object(map) => map.get(key).unwrap_or(&Value::Null),
        other => other,
    };
    if field_type == "boolean" {
        return if truthy(scalar) { "1" } else { "0" }.to_string();
    }
    match scalar {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => if *flag { "1" } else { "" }.to_string(),
        other => other.to_string(),
    }
}

/// Builds a validation finding.
fn issue(row: usize, field: &str, message: &str) -> ValidationIssue {
    ValidationIssue {
        row,
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Generates a random import identifier.
fn new_import_id() -> String {
    format!("import_{}", Uuid::new_v4().simple())
}

/// Converts unix seconds to a UTC datetime.
fn to_datetime(secs: u64) -> Result<OffsetDateTime, MigrationError> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .ok_or_else(|| MigrationError::Store(format!("timestamp out of range: {secs}")))
}

/// Formats unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
fn format_datetime(secs: u64) -> Result<String, MigrationError> {
    to_datetime(secs)?
        .format(CSV_DATETIME_FORMAT)
        .map_err(|err| MigrationError::Store(format!("timestamp format failed: {err}")))
}

/// Formats unix seconds as RFC 3339 (UTC).
fn format_rfc3339(secs: u64) -> Result<String, MigrationError> {
    to_datetime(secs)?
        .format(&Rfc3339)
        .map_err(|err| MigrationError::Store(format!("timestamp format failed: {err}")))
}
