// mcp-tools-migration/tests/migration_service.rs
// ============================================================================
// Module: Migration Service Tests
// Description: Import, validation, export, and status behavior.
// Purpose: Exercise the migration service over in-memory stores.
// Dependencies: mcp-tools-core, mcp-tools-migration, serde_json
// ============================================================================

//! Migration service integration tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use mcp_tools_core::AcquireOutcome;
use mcp_tools_core::Actor;
use mcp_tools_core::ErrorCode;
use mcp_tools_core::ImportState;
use mcp_tools_core::ImportStatus;
use mcp_tools_core::InMemoryStateStore;
use mcp_tools_core::ManualClock;
use mcp_tools_core::ProtectedFieldFilter;
use mcp_tools_core::StateStore;
use mcp_tools_core::StoreError;
use mcp_tools_core::WindowLimit;
use mcp_tools_core::WindowState;
use mcp_tools_migration::ContentRecord;
use mcp_tools_migration::ContentStore;
use mcp_tools_migration::ContentStoreError;
use mcp_tools_migration::ContentType;
use mcp_tools_migration::ImportStatusReport;
use mcp_tools_migration::InMemoryContentStore;
use mcp_tools_migration::MigrationError;
use mcp_tools_migration::MigrationService;
use mcp_tools_migration::NewContent;
use serde_json::json;

use crate::common::NOW;
use crate::common::event_type;
use crate::common::fixture;
use crate::common::items;

fn editor() -> Actor {
    Actor::new("7", "editor")
}

// ============================================================================
// SECTION: JSON Import
// ============================================================================

#[test]
fn blank_title_fails_only_its_row() {
    let fx = fixture();
    let batch = items(json!([
        {"title": "First"},
        {"title": "   "},
        {"name": "Third"}
    ]));
    let report = fx.service.import_from_json("page", &batch, &editor()).unwrap();
    assert_eq!(report.total_items, 3);
    assert_eq!(report.created_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed[0].row, 2);
    assert_eq!(report.failed[0].error, "Title (or name) is required.");
    assert_eq!(report.created[1].title, "Third");
    assert_eq!(report.created[1].row, 3);
    assert_eq!(report.message, "Successfully imported 2 of 3 items.");
    assert!(report.import_id.starts_with("import_"));
    assert_eq!(report.import_id.len(), "import_".len() + 32);
}

#[test]
fn missing_title_gets_placeholder() {
    let fx = fixture();
    let report = fx.service.import_from_json("page", &items(json!([{}, {}])), &editor()).unwrap();
    assert_eq!(report.created_count, 2);
    assert_eq!(report.created[1].title, "Imported item 2");
    assert!(report.warnings.iter().any(|warning| warning.field == "title" && warning.row == 1));
}

#[test]
fn protected_fields_never_reach_the_store() {
    let fx = fixture();
    let batch = items(json!([{
        "title": "Launch",
        "status": 1,
        "moderation_state": "published",
        "uid": 1,
        "revision_log": "sneaky",
        "venue": "12",
        "capacity": "40 seats",
        "body": "Hello",
        "unknown": "dropped"
    }]));
    let report = fx.service.import_from_json("event", &batch, &editor()).unwrap();
    assert_eq!(report.created_count, 1);

    let records = fx.content.list_by_type("event", 10).unwrap();
    let record = &records[0];
    assert!(record.status);
    assert_eq!(record.uid, "7");
    assert!(!record.fields.contains_key("field_moderation_state"));
    assert!(!record.fields.contains_key("moderation_state"));
    assert!(!record.fields.contains_key("status"));
    assert!(!record.fields.contains_key("uid"));
    assert!(!record.fields.contains_key("unknown"));
    assert_eq!(record.fields["field_venue"], json!({"target_id": 12}));
    assert_eq!(record.fields["field_capacity"], json!(40));
    assert_eq!(record.fields["body"], json!({"value": "Hello", "format": "basic_html"}));
}

#[test]
fn unpublished_by_default() {
    let fx = fixture();
    fx.service
        .import_from_json("page", &items(json!([{"title": "Draft"}, {"title": "Live", "status": "yes"}])), &editor())
        .unwrap();
    let records = fx.content.list_by_type("page", 10).unwrap();
    assert!(!records[0].status);
    assert!(records[1].status);
}

#[test]
fn oversized_batch_is_rejected_before_processing() {
    let fx = fixture();
    let batch: Vec<_> =
        (0 .. 101).map(|index| items(json!([{"title": format!("Item {index}")}])).remove(0)).collect();
    let err = fx.service.import_from_json("page", &batch, &editor()).unwrap_err();
    assert!(matches!(err, MigrationError::Validation(_)));
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(err.to_string(), "Import limited to 100 items per call. Received 101 items.");
    assert!(fx.content.is_empty());
    assert!(fx.state.load_import_status().unwrap().is_none());
}

#[test]
fn unknown_content_type_is_not_found() {
    let fx = fixture();
    let err = fx.service.import_from_json("recipe", &items(json!([{"title": "x"}])), &editor()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.to_string(), "Content type 'recipe' not found.");
}

// ============================================================================
// SECTION: CSV Import
// ============================================================================

#[test]
fn csv_import_applies_header_mapping() {
    let fx = fixture();
    let csv = "Headline , venue,capacity\n\"Gala, annual\",3,100\n\nBroken row\nPicnic,4,20\n";
    let mapping = BTreeMap::from([("Headline".to_string(), "title".to_string())]);
    let report = fx.service.import_from_csv("event", csv, &mapping, &editor()).unwrap();
    assert_eq!(report.total_items, 2);
    assert_eq!(report.created_count, 2);
    assert_eq!(report.created[0].title, "Gala, annual");

    let records = fx.content.list_by_type("event", 10).unwrap();
    assert_eq!(records[1].fields["field_venue"], json!({"target_id": 4}));
}

#[test]
fn csv_without_data_rows_is_rejected() {
    let fx = fixture();
    let err = fx.service.import_from_csv("page", "title\n", &BTreeMap::new(), &editor()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(err.to_string(), "CSV must contain a header row and at least one data row.");
}

// ============================================================================
// SECTION: Validation And Mapping
// ============================================================================

#[test]
fn validation_reports_errors_and_warnings() {
    let fx = fixture();
    let batch = items(json!([
        {"title": "Ok", "date": "2024-01-01", "body": "x"},
        {"title": "", "field_date": "2024-01-01"},
        {"title": "No date", "uid": 3, "mystery": true}
    ]));
    let report = fx.service.validate_import("event", &batch).unwrap();
    assert!(!report.valid);
    assert_eq!(report.total_items, 3);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors[0].row, 2);
    let mut fields: Vec<_> =
        report.warnings.iter().map(|warning| (warning.row, warning.field.as_str())).collect();
    fields.sort_unstable();
    assert_eq!(fields, vec![(3, "field_date"), (3, "mystery"), (3, "uid")]);
    assert_eq!(report.warning_count, 3);
}

#[test]
fn validation_of_clean_batch_is_valid() {
    let fx = fixture();
    let report = fx.service.validate_import("page", &items(json!([{"title": "A", "body": "b"}]))).unwrap();
    assert!(report.valid);
    assert_eq!(report.warning_count, 0);
}

#[test]
fn field_mapping_lists_importable_fields() {
    let fx = fixture();
    let mapping = fx.service.get_field_mapping("event").unwrap();
    assert_eq!(mapping.label, "Event");
    assert_eq!(mapping.required.keys().collect::<Vec<_>>(), vec!["field_date", "title"]);
    assert_eq!(mapping.required["title"].description, "The content title (required).");
    assert_eq!(mapping.required["field_date"].description, "When the event starts.");
    assert_eq!(mapping.optional["body"].description, "No description available.");
    assert!(mapping.optional.contains_key("field_capacity"));
    assert!(!mapping.optional.contains_key("title"));

    let value = serde_json::to_value(&mapping).unwrap();
    assert_eq!(value["optional"]["field_capacity"]["type"], "integer");
}

// ============================================================================
// SECTION: Export And Search
// ============================================================================

#[test]
fn csv_export_renders_simple_values() {
    let fx = fixture();
    let batch = items(json!([
        {"title": "Quote \"this\"", "status": true, "venue": 9, "free": "1", "body": "Line"},
        {"title": "Plain"}
    ]));
    fx.service.import_from_json("event", &batch, &editor()).unwrap();
    let export = fx.service.export_to_csv("event", 500).unwrap();
    assert_eq!(export.exported_count, 2);
    assert_eq!(export.message, "Exported 2 items of type event.");
    assert_eq!(export.fields[.. 4], ["nid", "title", "status", "created"]);
    let lines: Vec<_> = export.csv_data.split('\n').collect();
    assert_eq!(
        lines[0],
        "nid,title,status,created,body,field_venue,field_capacity,field_moderation_state,field_free,field_date"
    );
    assert_eq!(lines[1], "1,\"Quote \"\"this\"\"\",1,2023-11-14 22:13:20,Line,9,,,1,");
    assert_eq!(lines[2], "2,Plain,0,2023-11-14 22:13:20,,,,,,");
}

#[test]
fn csv_export_pads_single_digit_date_parts() {
    let fx = fixture();
    fx.clock.set(1_709_622_489);
    fx.service.import_from_json("page", &items(json!([{"title": "March"}])), &editor()).unwrap();
    let export = fx.service.export_to_csv("page", 10).unwrap();
    let row = export.csv_data.split('\n').nth(1).unwrap();
    assert!(row.starts_with("1,March,0,2024-03-05 07:08:09"), "row: {row}");
}

#[test]
fn json_export_includes_null_for_empty_fields() {
    let fx = fixture();
    fx.service.import_from_json("page", &items(json!([{"title": "Only"}])), &editor()).unwrap();
    fx.clock.advance(60);
    let export = fx.service.export_to_json("page", 10).unwrap();
    let item = &export.items[0];
    assert_eq!(item["nid"], 1);
    assert_eq!(item["status"], 0);
    assert_eq!(item["created"], "2023-11-14T22:13:20Z");
    assert_eq!(item["body"], serde_json::Value::Null);
    assert_eq!(item["uuid"].as_str().map(str::len), Some(36));
}

#[test]
fn search_filters_and_limits() {
    let fx = fixture();
    let batch = items(json!([{"title": "Annual report"}, {"title": "Report card"}, {"title": "Other"}]));
    fx.service.import_from_json("page", &batch, &editor()).unwrap();
    fx.service.import_from_json("article", &items(json!([{"title": "Report news"}])), &editor()).unwrap();

    let all = fx.service.search_content("report", None, None).unwrap();
    assert_eq!(all.total, 3);
    let pages = fx.service.search_content("REPORT", Some("page"), Some(1)).unwrap();
    assert_eq!(pages.total, 2);
    assert_eq!(pages.items.len(), 1);
    assert_eq!(pages.items[0].title, "Annual report");

    let err = fx.service.search_content("  ", None, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

// ============================================================================
// SECTION: Import Status
// ============================================================================

#[test]
fn import_status_tracks_latest_import() {
    let fx = fixture();
    let empty = serde_json::to_value(fx.service.get_import_status().unwrap()).unwrap();
    assert_eq!(empty, json!({"has_import": false, "message": "No recent import found."}));

    let report =
        fx.service.import_from_json("page", &items(json!([{"title": "A"}, {"title": ""}])), &editor()).unwrap();
    match fx.service.get_import_status().unwrap() {
        ImportStatusReport::Found {
            has_import,
            import_id,
            status,
            total_items,
            processed,
            failed,
            started_at,
            ..
        } => {
            assert!(has_import);
            assert_eq!(import_id, report.import_id);
            assert_eq!(status, ImportState::Completed);
            assert_eq!((total_items, processed, failed), (2, 1, 1));
            assert_eq!(started_at, "2023-11-14T22:13:20Z");
        }
        ImportStatusReport::Missing { .. } => panic!("expected import status"),
    }
}

/// Content store whose backend fails after a number of creates.
struct FailingStore {
    inner: InMemoryContentStore,
    remaining: std::sync::Mutex<usize>,
}

impl ContentStore for FailingStore {
    fn content_type(&self, id: &str) -> Result<Option<ContentType>, ContentStoreError> {
        self.inner.content_type(id)
    }

    fn create(&self, content: NewContent, now: u64) -> Result<ContentRecord, ContentStoreError> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Err(ContentStoreError::Backend("disk full".to_string()));
        }
        *remaining -= 1;
        self.inner.create(content, now)
    }

    fn list_by_type(&self, content_type: &str, limit: usize) -> Result<Vec<ContentRecord>, ContentStoreError> {
        self.inner.list_by_type(content_type, limit)
    }

    fn search_titles(
        &self,
        query: &str,
        content_type: Option<&str>,
    ) -> Result<Vec<ContentRecord>, ContentStoreError> {
        self.inner.search_titles(query, content_type)
    }
}

#[test]
fn backend_failure_aborts_and_marks_status_failed() {
    let inner = InMemoryContentStore::new();
    inner.insert_type(event_type()).unwrap();
    let store = FailingStore {
        inner,
        remaining: std::sync::Mutex::new(1),
    };
    let state = InMemoryStateStore::new();
    let service = MigrationService::new(
        Arc::new(store),
        Arc::new(state.clone()),
        Arc::new(ProtectedFieldFilter::builtin().unwrap()),
        Arc::new(ManualClock::new(NOW)),
    );
    let batch = items(json!([{"title": "One"}, {"title": "Two"}, {"title": "Three"}]));
    let err = service.import_from_json("event", &batch, &editor()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExecutionFailed);
    assert_eq!(err.to_string(), "Import failed: content store error: disk full");

    let status = state.load_import_status().unwrap().unwrap();
    assert_eq!(status.status, ImportState::Failed);
    assert_eq!(status.processed, 1);
    assert_eq!(status.total_items, 3);
}

/// State store whose status slot accepts a fixed number of saves.
struct StatusSlotLimit {
    inner: InMemoryStateStore,
    remaining: std::sync::Mutex<usize>,
}

impl StateStore for StatusSlotLimit {
    fn acquire(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<AcquireOutcome, StoreError> {
        self.inner.acquire(client_key, limits, now)
    }

    fn record(&self, client_key: &str, limits: &[WindowLimit], now: u64) -> Result<(), StoreError> {
        self.inner.record(client_key, limits, now)
    }

    fn load_window(&self, client_key: &str, counter: &str) -> Result<Option<WindowState>, StoreError> {
        self.inner.load_window(client_key, counter)
    }

    fn reset_counters(&self, client_key: &str, counters: &[String]) -> Result<(), StoreError> {
        self.inner.reset_counters(client_key, counters)
    }

    fn load_import_status(&self) -> Result<Option<ImportStatus>, StoreError> {
        self.inner.load_import_status()
    }

    fn save_import_status(&self, status: &ImportStatus) -> Result<(), StoreError> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Err(StoreError::Io("status slot locked".to_string()));
        }
        *remaining -= 1;
        self.inner.save_import_status(status)
    }
}

#[test]
fn unsaved_failed_status_is_reported() {
    let content = InMemoryContentStore::new();
    content.insert_type(event_type()).unwrap();
    let state = StatusSlotLimit {
        inner: InMemoryStateStore::new(),
        remaining: std::sync::Mutex::new(1),
    };
    let service = MigrationService::new(
        Arc::new(content),
        Arc::new(state),
        Arc::new(ProtectedFieldFilter::builtin().unwrap()),
        Arc::new(ManualClock::new(NOW)),
    );
    let err = service.import_from_json("event", &items(json!([{"title": "One"}])), &editor()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExecutionFailed);
    assert_eq!(
        err.to_string(),
        "Import failed: state store io error: status slot locked (failed status not saved: state \
         store io error: status slot locked)"
    );
}

// ============================================================================
// SECTION: Seeding
// ============================================================================

#[test]
fn seeded_store_exports_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.json");
    let seed = json!({
        "content_types": [{"id": "faq", "label": "FAQ", "fields": [
            {"name": "title", "label": "Title", "field_type": "string", "required": true},
            {"name": "field_answer", "label": "Answer", "field_type": "text_long"}
        ]}],
        "records": [
            {"content_type": "faq", "title": "Why?", "status": true, "created": 0,
             "fields": {"field_answer": [{"value": "Because."}]}}
        ]
    });
    std::fs::write(&path, serde_json::to_vec(&seed).unwrap()).unwrap();
    let store = InMemoryContentStore::load_seed(&path, NOW).unwrap();
    let service = MigrationService::new(
        Arc::new(store),
        Arc::new(InMemoryStateStore::new()),
        Arc::new(ProtectedFieldFilter::builtin().unwrap()),
        Arc::new(ManualClock::new(NOW)),
    );
    let export = service.export_to_csv("faq", 10).unwrap();
    assert_eq!(export.csv_data, "nid,title,status,created,field_answer\n1,Why?,1,1970-01-01 00:00:00,Because.");
}
