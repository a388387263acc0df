// mcp-tools-core/src/runtime/audit.rs
// ============================================================================
// Module: Audit Logging
// Description: Append-only audit records for governed tool operations.
// Purpose: Record who did what, with sensitive details redacted.
// Dependencies: crate::core, crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! [`AuditLogger`] renders one [`AuditRecord`] per governed operation and hands
//! it to an [`AuditSink`]. Sinks emit JSON lines and swallow their own I/O
//! failures, so auditing never fails the operation being audited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::context::RequestContext;
use crate::interfaces::Clock;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Key fragments whose values are redacted.
const SENSITIVE_KEYS: &[&str] =
    &["password", "pass", "secret", "token", "key", "credentials", "api_key"];

/// Replacement for redacted values.
const REDACTED: &str = "[REDACTED]";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit record payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Actor identifier.
    pub actor_id: String,
    /// Actor display name.
    pub actor_name: String,
    /// Operation performed.
    pub action: String,
    /// Resource type acted upon.
    pub resource_type: String,
    /// Resource identifier acted upon.
    pub resource_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Rendered message.
    pub message: String,
    /// Sanitized details.
    pub details: Value,
}

/// Audit sink for records.
pub trait AuditSink: Send + Sync {
    /// Records an audit entry.
    fn record(&self, record: &AuditRecord);
}

/// Audit sink writing JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(payload) = serde_json::to_string(record) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink appending JSON lines to a file.
pub struct FileAuditSink {
    /// Append-only file handle.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens a file-backed audit sink.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(payload) = serde_json::to_string(record)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink that drops records.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

/// Audit sink that keeps records in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Captured records.
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

// ============================================================================
// SECTION: Audit Logger
// ============================================================================

/// Audit logger for governed operations.
#[derive(Clone)]
pub struct AuditLogger {
    /// Whether records are emitted.
    enabled: bool,
    /// Destination sink.
    sink: Arc<dyn AuditSink>,
    /// Source of record timestamps.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AuditLogger {
    /// Builds an audit logger.
    #[must_use]
    pub fn new(
        enabled: bool,
        sink: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            enabled,
            sink,
            clock,
        }
    }

    /// Builds a logger that never records.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, Arc::new(NoopAuditSink), Arc::new(SystemClock))
    }

    /// Returns true when records are emitted.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records an operation outcome.
    pub fn log(
        &self,
        context: &RequestContext,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        details: &Value,
        success: bool,
    ) {
        if !self.enabled {
            return;
        }
        let actor = &context.actor;
        let actor_name = if actor.name.is_empty() { "anonymous" } else { actor.name.as_str() };
        let message = format!(
            "MCP: {action} on {resource_type} \"{resource_id}\" by {actor_name} (uid: {})",
            actor.id
        );
        let record = AuditRecord {
            event: "mcp_tool_operation",
            timestamp_ms: self.clock.now_unix_millis(),
            request_id: context.request_id.clone(),
            actor_id: actor.id.clone(),
            actor_name: actor_name.to_string(),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            success,
            message,
            details: sanitize_details(details),
        };
        self.sink.record(&record);
    }

    /// Records a successful operation.
    pub fn log_success(
        &self,
        context: &RequestContext,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        details: &Value,
    ) {
        self.log(context, action, resource_type, resource_id, details, true);
    }

    /// Records a failed operation.
    pub fn log_failure(
        &self,
        context: &RequestContext,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        details: &Value,
    ) {
        self.log(context, action, resource_type, resource_id, details, false);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Redacts sensitive keys recursively.
///
/// Any object key containing a sensitive fragment (case-insensitive) has its
/// value replaced with `"[REDACTED]"`, including nested objects and objects
/// inside arrays.
#[must_use]
pub fn sanitize_details(details: &Value) -> Value {
    match details {
        Value::Object(map) => {
            let mut sanitized = Map::with_capacity(map.len());
            for (key, value) in map {
                let lower = key.to_lowercase();
                let redacted = SENSITIVE_KEYS.iter().any(|fragment| lower.contains(fragment));
                let value =
                    if redacted { Value::String(REDACTED.to_string()) } else { sanitize_details(value) };
                sanitized.insert(key.clone(), value);
            }
            Value::Object(sanitized)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_details).collect()),
        other => other.clone(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
