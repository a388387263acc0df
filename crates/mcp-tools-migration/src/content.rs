// mcp-tools-migration/src/content.rs
// ============================================================================
// Module: Content Store
// Description: Content type definitions and the content persistence seam.
// Purpose: Give the migration service a typed view of bundles and records.
// Dependencies: mcp-tools-core, serde, serde_json, thiserror, uuid
// ============================================================================

//! ## Overview
//! [`ContentStore`] is the boundary between the migration service and the
//! site's entity storage. [`InMemoryContentStore`] implements it for tests
//! and standalone servers; it can be seeded from a JSON document describing
//! content types and existing records.
//!
//! ## Invariants
//! - Node ids are assigned sequentially starting at 1 and never reused.
//! - Records are returned in ascending node id order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum title length accepted by the store.
pub const MAX_TITLE_LENGTH: usize = 255;
/// Maximum seed file size in bytes.
const MAX_SEED_FILE_SIZE: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Field definition on a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Machine name (`body`, `field_tags`, ...).
    pub name: String,
    /// Human label.
    pub label: String,
    /// Storage type name (`string`, `text_long`, `entity_reference`, ...).
    pub field_type: String,
    /// Help text.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether a value is required.
    #[serde(default)]
    pub required: bool,
    /// Allowed values for list fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Value>,
}

impl FieldDefinition {
    /// Builds an optional field without description.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type: field_type.into(),
            description: None,
            required: false,
            allowed_values: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Content type (bundle) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    /// Machine name.
    pub id: String,
    /// Human label.
    pub label: String,
    /// Field definitions in display order.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ContentType {
    /// Looks up a field definition by machine name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns true when the bundle defines `name`.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Stored content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Node id.
    pub nid: u64,
    /// Universally unique id.
    pub uuid: String,
    /// Bundle machine name.
    pub content_type: String,
    /// Title.
    pub title: String,
    /// Published flag.
    pub status: bool,
    /// Author id.
    pub uid: String,
    /// Creation time (unix seconds).
    pub created: u64,
    /// Last change time (unix seconds).
    pub changed: u64,
    /// Field values keyed by machine name.
    pub fields: Map<String, Value>,
}

/// Payload for creating a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContent {
    /// Bundle machine name.
    pub content_type: String,
    /// Title.
    pub title: String,
    /// Published flag.
    pub status: bool,
    /// Author id.
    pub uid: String,
    /// Field values keyed by machine name.
    pub fields: Map<String, Value>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Content store errors.
#[derive(Debug, Error)]
pub enum ContentStoreError {
    /// The entity failed store-side validation; only this record is affected.
    #[error("{0}")]
    Rejected(String),
    /// The store itself failed.
    #[error("content store error: {0}")]
    Backend(String),
    /// Seed data could not be loaded.
    #[error("content seed error: {0}")]
    Seed(String),
}

// ============================================================================
// SECTION: Store Interface
// ============================================================================

/// Entity storage used by the migration service.
pub trait ContentStore {
    /// Loads a content type.
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError`] when the store cannot be read.
    fn content_type(&self, id: &str) -> Result<Option<ContentType>, ContentStoreError>;

    /// Creates a record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError::Rejected`] when the record is invalid and
    /// [`ContentStoreError::Backend`] when the store fails.
    fn create(&self, content: NewContent, now: u64) -> Result<ContentRecord, ContentStoreError>;

    /// Lists up to `limit` records of a content type in id order.
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError`] when the store cannot be read.
    fn list_by_type(
        &self,
        content_type: &str,
        limit: usize,
    ) -> Result<Vec<ContentRecord>, ContentStoreError>;

    /// Returns every record whose title contains `query` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError`] when the store cannot be read.
    fn search_titles(
        &self,
        query: &str,
        content_type: Option<&str>,
    ) -> Result<Vec<ContentRecord>, ContentStoreError>;
}

// ============================================================================
// SECTION: Seed
// ============================================================================

/// Seed document for the in-memory store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentSeed {
    /// Content types to register.
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    /// Records to insert, in order.
    #[serde(default)]
    pub records: Vec<SeedRecord>,
}

/// Record entry in a seed document.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedRecord {
    /// Bundle machine name.
    pub content_type: String,
    /// Title.
    pub title: String,
    /// Published flag.
    #[serde(default)]
    pub status: bool,
    /// Author id.
    #[serde(default = "default_seed_uid")]
    pub uid: String,
    /// Creation time; defaults to load time.
    #[serde(default)]
    pub created: Option<u64>,
    /// Change time; defaults to creation time.
    #[serde(default)]
    pub changed: Option<u64>,
    /// Field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Default author for seed records.
fn default_seed_uid() -> String {
    "1".to_string()
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state of the in-memory store.
#[derive(Debug, Default)]
struct ContentState {
    /// Content types keyed by id.
    types: BTreeMap<String, ContentType>,
    /// Records keyed by node id.
    records: BTreeMap<u64, ContentRecord>,
    /// Last assigned node id.
    last_nid: u64,
}

/// In-memory content store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryContentStore {
    /// Shared state guarded by a mutex.
    state: Arc<Mutex<ContentState>>,
}

impl InMemoryContentStore {
    /// Creates an empty store with no content types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the `article` and `page` bundles.
    #[must_use]
    pub fn with_standard_types() -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            for content_type in standard_types() {
                state.types.insert(content_type.id.clone(), content_type);
            }
        }
        store
    }

    /// Builds a store from a parsed seed document.
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError::Seed`] when a record references an
    /// unknown content type or fails validation.
    pub fn from_seed(seed: ContentSeed, now: u64) -> Result<Self, ContentStoreError> {
        let store = Self::new();
        {
            let mut state = store.lock()?;
            for content_type in seed.content_types {
                if content_type.id.trim().is_empty() {
                    return Err(ContentStoreError::Seed(
                        "content type id must be non-empty".to_string(),
                    ));
                }
                state.types.insert(content_type.id.clone(), content_type);
            }
        }
        for record in seed.records {
            if store.content_type(&record.content_type)?.is_none() {
                return Err(ContentStoreError::Seed(format!(
                    "record '{}' references unknown content type '{}'",
                    record.title, record.content_type
                )));
            }
            let created = record.created.unwrap_or(now);
            let changed = record.changed.unwrap_or(created);
            let content = NewContent {
                content_type: record.content_type,
                title: record.title,
                status: record.status,
                uid: record.uid,
                fields: record.fields,
            };
            let mut stored = store.create(content, created).map_err(|err| match err {
                ContentStoreError::Rejected(message) => ContentStoreError::Seed(message),
                other => other,
            })?;
            stored.changed = changed;
            let mut state = store.lock()?;
            state.records.insert(stored.nid, stored);
        }
        Ok(store)
    }

    /// Loads a seed document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError::Seed`] when the file cannot be read or
    /// parsed, or its records are invalid.
    pub fn load_seed(path: &Path, now: u64) -> Result<Self, ContentStoreError> {
        let bytes = fs::read(path).map_err(|err| ContentStoreError::Seed(err.to_string()))?;
        if bytes.len() > MAX_SEED_FILE_SIZE {
            return Err(ContentStoreError::Seed("seed file exceeds size limit".to_string()));
        }
        let seed: ContentSeed =
            serde_json::from_slice(&bytes).map_err(|err| ContentStoreError::Seed(err.to_string()))?;
        Self::from_seed(seed, now)
    }

    /// Registers or replaces a content type.
    ///
    /// # Errors
    ///
    /// Returns [`ContentStoreError::Backend`] when the store lock is poisoned.
    pub fn insert_type(&self, content_type: ContentType) -> Result<(), ContentStoreError> {
        self.lock()?.types.insert(content_type.id.clone(), content_type);
        Ok(())
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.records.len()).unwrap_or_default()
    }

    /// Returns true when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Acquires the state lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ContentState>, ContentStoreError> {
        self.state
            .lock()
            .map_err(|_| ContentStoreError::Backend("content store mutex poisoned".to_string()))
    }
}

impl ContentStore for InMemoryContentStore {
    fn content_type(&self, id: &str) -> Result<Option<ContentType>, ContentStoreError> {
        Ok(self.lock()?.types.get(id).cloned())
    }

    fn create(&self, content: NewContent, now: u64) -> Result<ContentRecord, ContentStoreError> {
        let title = content.title.trim();
        if title.is_empty() {
            return Err(ContentStoreError::Rejected("Title cannot be empty.".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ContentStoreError::Rejected(format!(
                "Title cannot be longer than {MAX_TITLE_LENGTH} characters."
            )));
        }
        let mut state = self.lock()?;
        if !state.types.contains_key(&content.content_type) {
            return Err(ContentStoreError::Rejected(format!(
                "Content type '{}' does not exist.",
                content.content_type
            )));
        }
        state.last_nid = state.last_nid.saturating_add(1);
        let record = ContentRecord {
            nid: state.last_nid,
            uuid: Uuid::new_v4().to_string(),
            content_type: content.content_type,
            title: title.to_string(),
            status: content.status,
            uid: content.uid,
            created: now,
            changed: now,
            fields: content.fields,
        };
        state.records.insert(record.nid, record.clone());
        Ok(record)
    }

    fn list_by_type(
        &self,
        content_type: &str,
        limit: usize,
    ) -> Result<Vec<ContentRecord>, ContentStoreError> {
        let state = self.lock()?;
        Ok(state
            .records
            .values()
            .filter(|record| record.content_type == content_type)
            .take(limit)
            .cloned()
            .collect())
    }

    fn search_titles(
        &self,
        query: &str,
        content_type: Option<&str>,
    ) -> Result<Vec<ContentRecord>, ContentStoreError> {
        let needle = query.trim().to_lowercase();
        let state = self.lock()?;
        Ok(state
            .records
            .values()
            .filter(|record| content_type.is_none_or(|bundle| record.content_type == bundle))
            .filter(|record| record.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the bundles of a standard site install.
fn standard_types() -> Vec<ContentType> {
    vec![
        ContentType {
            id: "article".to_string(),
            label: "Article".to_string(),
            fields: vec![
                FieldDefinition::new("title", "Title", "string").required(),
                FieldDefinition::new("body", "Body", "text_with_summary"),
                FieldDefinition::new("field_image", "Image", "image"),
                FieldDefinition::new("field_tags", "Tags", "entity_reference"),
            ],
        },
        ContentType {
            id: "page".to_string(),
            label: "Basic page".to_string(),
            fields: vec![
                FieldDefinition::new("title", "Title", "string").required(),
                FieldDefinition::new("body", "Body", "text_with_summary"),
            ],
        },
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use serde_json::Map;
    use serde_json::json;

    use super::ContentSeed;
    use super::ContentStore;
    use super::ContentStoreError;
    use super::InMemoryContentStore;
    use super::NewContent;

    fn new_page(title: &str) -> NewContent {
        NewContent {
            content_type: "page".to_string(),
            title: title.to_string(),
            status: true,
            uid: "1".to_string(),
            fields: Map::new(),
        }
    }

    #[test]
    fn nids_are_sequential() {
        let store = InMemoryContentStore::with_standard_types();
        let first = store.create(new_page("One"), 10).unwrap();
        let second = store.create(new_page("Two"), 11).unwrap();
        assert_eq!((first.nid, second.nid), (1, 2));
        assert_eq!(first.uuid.len(), 36);
        assert_eq!(&first.uuid[14 .. 15], "4");
        assert_ne!(first.uuid, second.uuid);
    }

    #[test]
    fn overlong_title_is_rejected() {
        let store = InMemoryContentStore::with_standard_types();
        let result = store.create(new_page(&"x".repeat(256)), 0);
        assert!(matches!(result, Err(ContentStoreError::Rejected(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_and_filters_bundle() {
        let store = InMemoryContentStore::with_standard_types();
        store.create(new_page("Hello World"), 0).unwrap();
        let mut article = new_page("hello article");
        article.content_type = "article".to_string();
        store.create(article, 0).unwrap();
        assert_eq!(store.search_titles("HELLO", None).unwrap().len(), 2);
        assert_eq!(store.search_titles("hello", Some("page")).unwrap().len(), 1);
    }

    #[test]
    fn seed_rejects_unknown_bundle() {
        let seed: ContentSeed = serde_json::from_value(json!({
            "content_types": [{"id": "event", "label": "Event"}],
            "records": [{"content_type": "venue", "title": "Hall"}]
        }))
        .unwrap();
        assert!(matches!(InMemoryContentStore::from_seed(seed, 0), Err(ContentStoreError::Seed(_))));
    }

    #[test]
    fn seed_preserves_timestamps() {
        let seed: ContentSeed = serde_json::from_value(json!({
            "content_types": [{"id": "event", "label": "Event", "fields": [
                {"name": "field_date", "label": "Date", "field_type": "datetime"}
            ]}],
            "records": [{"content_type": "event", "title": "Launch", "status": true,
                         "created": 100, "changed": 200,
                         "fields": {"field_date": {"value": "2026-01-01"}}}]
        }))
        .unwrap();
        let store = InMemoryContentStore::from_seed(seed, 999).unwrap();
        let records = store.list_by_type("event", 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].created, records[0].changed), (100, 200));
    }
}
