// mcp-tools-migration/tests/common/mod.rs
// ============================================================================
// Module: Migration Test Helpers
// Description: Shared fixtures for migration service tests.
// Purpose: Build services over in-memory stores with a fixed clock.
// Dependencies: mcp-tools-core, mcp-tools-migration, serde_json
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;

use mcp_tools_core::InMemoryStateStore;
use mcp_tools_core::ManualClock;
use mcp_tools_core::ProtectedFieldFilter;
use mcp_tools_migration::ContentType;
use mcp_tools_migration::FieldDefinition;
use mcp_tools_migration::ImportItem;
use mcp_tools_migration::InMemoryContentStore;
use mcp_tools_migration::MigrationService;
use serde_json::Value;

/// Fixed clock time: 2023-11-14T22:13:20Z.
pub const NOW: u64 = 1_700_000_000;

/// Service plus handles to its backing stores.
pub struct Fixture {
    pub service: MigrationService,
    pub content: InMemoryContentStore,
    pub state: InMemoryStateStore,
    pub clock: Arc<ManualClock>,
}

/// Returns the `event` bundle used across suites.
pub fn event_type() -> ContentType {
    let mut date = FieldDefinition::new("field_date", "Date", "datetime").required();
    date.description = Some("When the event starts.".to_string());
    ContentType {
        id: "event".to_string(),
        label: "Event".to_string(),
        fields: vec![
            FieldDefinition::new("title", "Title", "string").required(),
            FieldDefinition::new("body", "Body", "text_long"),
            FieldDefinition::new("field_venue", "Venue", "entity_reference"),
            FieldDefinition::new("field_capacity", "Capacity", "integer"),
            FieldDefinition::new("field_moderation_state", "Moderation", "string"),
            FieldDefinition::new("field_free", "Free", "boolean"),
            date,
        ],
    }
}

/// Builds a service over the standard bundles plus `event`.
pub fn fixture() -> Fixture {
    let content = InMemoryContentStore::with_standard_types();
    content.insert_type(event_type()).expect("insert event type");
    let state = InMemoryStateStore::new();
    let clock = Arc::new(ManualClock::new(NOW));
    let filter = ProtectedFieldFilter::builtin().expect("builtin filter");
    let service = MigrationService::new(
        Arc::new(content.clone()),
        Arc::new(state.clone()),
        Arc::new(filter),
        clock.clone(),
    );
    Fixture {
        service,
        content,
        state,
        clock,
    }
}

/// Converts a JSON array literal into import items.
pub fn items(value: Value) -> Vec<ImportItem> {
    let Value::Array(entries) = value else {
        panic!("items must be an array");
    };
    entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(map) => map,
            other => panic!("item must be an object: {other}"),
        })
        .collect()
}
