// mcp-tools-mcp/src/tooling.rs
// ============================================================================
// Module: Tool Registry
// Description: Canonical tool identifiers, governance classes, and schemas.
// Purpose: Static registry of every tool exposed over MCP.
// Dependencies: mcp-tools-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Tools are registered statically. Each [`ToolName`] maps to a fixed
//! [`ToolSpec`] describing its operation class, write kind, and rate class,
//! and to a [`ToolDefinition`] carrying the JSON schema clients see in
//! `tools/list`. These names are part of the external contract surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use mcp_tools_core::Operation;
use mcp_tools_core::OperationType;
use mcp_tools_core::WriteKind;
use mcp_tools_core::runtime::rate_limit::CONTENT_SEARCH;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Import items from a JSON array.
    ImportFromJson,
    /// Import items from CSV text.
    ImportFromCsv,
    /// Check items without importing.
    ValidateImport,
    /// List importable fields of a content type.
    GetFieldMapping,
    /// Export content as CSV.
    ExportToCsv,
    /// Export content as JSON.
    ExportToJson,
    /// Report the most recent import.
    GetImportStatus,
    /// List protected fields.
    GetProtectedFields,
    /// Report access mode and scopes.
    GetAccessStatus,
    /// Report rate-limit usage for the caller.
    GetRateLimitStatus,
    /// Search content titles.
    SearchContent,
    /// Clear rate-limit counters.
    ResetRateLimits,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImportFromJson => "import_from_json",
            Self::ImportFromCsv => "import_from_csv",
            Self::ValidateImport => "validate_import",
            Self::GetFieldMapping => "get_field_mapping",
            Self::ExportToCsv => "export_to_csv",
            Self::ExportToJson => "export_to_json",
            Self::GetImportStatus => "get_import_status",
            Self::GetProtectedFields => "get_protected_fields",
            Self::GetAccessStatus => "get_access_status",
            Self::GetRateLimitStatus => "get_rate_limit_status",
            Self::SearchContent => "search_content",
            Self::ResetRateLimits => "reset_rate_limits",
        }
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ImportFromJson,
            Self::ImportFromCsv,
            Self::ValidateImport,
            Self::GetFieldMapping,
            Self::ExportToCsv,
            Self::ExportToJson,
            Self::GetImportStatus,
            Self::GetProtectedFields,
            Self::GetAccessStatus,
            Self::GetRateLimitStatus,
            Self::SearchContent,
            Self::ResetRateLimits,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }

    /// Returns the governance class of the tool.
    #[must_use]
    pub const fn spec(self) -> ToolSpec {
        match self {
            Self::ImportFromJson | Self::ImportFromCsv => ToolSpec {
                operation: Operation::Write,
                category: "migration",
                kind: None,
                rate: RateClass::Write(OperationType::Write),
            },
            Self::SearchContent => ToolSpec {
                operation: Operation::Read,
                category: "content",
                kind: None,
                rate: RateClass::ReadQuota(CONTENT_SEARCH),
            },
            Self::ResetRateLimits => ToolSpec {
                operation: Operation::Admin,
                category: "rate_limit",
                kind: Some(WriteKind::Ops),
                rate: RateClass::Write(OperationType::Structure),
            },
            Self::GetAccessStatus | Self::GetRateLimitStatus | Self::GetProtectedFields => {
                ToolSpec::read("governance")
            }
            Self::ValidateImport
            | Self::GetFieldMapping
            | Self::ExportToCsv
            | Self::ExportToJson
            | Self::GetImportStatus => ToolSpec::read("migration"),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Governance Classes
// ============================================================================

/// Rate class applied after the access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateClass {
    /// No rate limit.
    None,
    /// Write-class counters for the operation type.
    Write(OperationType),
    /// Named read quota.
    ReadQuota(&'static str),
}

/// Governance metadata of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Operation class checked against scopes.
    pub operation: Operation,
    /// Tool category; derives the write kind when `kind` is unset.
    pub category: &'static str,
    /// Explicit write kind override.
    pub kind: Option<WriteKind>,
    /// Rate class.
    pub rate: RateClass,
}

impl ToolSpec {
    /// Builds an unlimited read spec.
    const fn read(category: &'static str) -> Self {
        Self {
            operation: Operation::Read,
            category,
            kind: None,
            rate: RateClass::None,
        }
    }

    /// Returns the effective write kind.
    #[must_use]
    pub fn write_kind(&self) -> WriteKind {
        self.kind.unwrap_or_else(|| WriteKind::from_category(self.category))
    }
}

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Tool definition advertised to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    /// MCP tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    pub input_schema: Value,
}

/// Returns the definitions of every tool in canonical order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::all()
        .iter()
        .map(|tool| ToolDefinition {
            name: *tool,
            description: description(*tool).to_string(),
            input_schema: input_schema(*tool),
        })
        .collect()
}

/// Returns the client-facing description of a tool.
const fn description(tool: ToolName) -> &'static str {
    match tool {
        ToolName::ImportFromJson => {
            "Import up to 100 items as new content. Protected fields are ignored."
        }
        ToolName::ImportFromCsv => {
            "Import up to 100 CSV rows as new content. The first row is the header."
        }
        ToolName::ValidateImport => "Check items against a content type without importing them.",
        ToolName::GetFieldMapping => "List the importable fields of a content type.",
        ToolName::ExportToCsv => "Export up to 100 items of a content type as CSV.",
        ToolName::ExportToJson => "Export up to 100 items of a content type as JSON.",
        ToolName::GetImportStatus => "Report the progress of the most recent import.",
        ToolName::GetProtectedFields => "List fields that can never be set via import.",
        ToolName::GetAccessStatus => "Report access mode and the scopes of this connection.",
        ToolName::GetRateLimitStatus => "Report rate-limit usage for this client.",
        ToolName::SearchContent => "Search content titles.",
        ToolName::ResetRateLimits => "Clear write, delete, and structure rate-limit counters for a client.",
    }
}

/// Returns the input schema of a tool.
#[must_use]
pub fn input_schema(tool: ToolName) -> Value {
    match tool {
        ToolName::ImportFromJson | ToolName::ValidateImport => object_schema(
            &json!({
                "content_type": content_type_property(),
                "items": {
                    "type": "array",
                    "items": {"type": "object"},
                    "description": "Items keyed by field name. Use title or name for the title."
                }
            }),
            &["content_type", "items"],
        ),
        ToolName::ImportFromCsv => object_schema(
            &json!({
                "content_type": content_type_property(),
                "csv_data": {"type": "string", "description": "CSV text with a header row."},
                "field_mapping": {
                    "type": "object",
                    "additionalProperties": {"type": "string"},
                    "description": "Maps CSV header names to field names."
                }
            }),
            &["content_type", "csv_data"],
        ),
        ToolName::GetFieldMapping => {
            object_schema(&json!({"content_type": content_type_property()}), &["content_type"])
        }
        ToolName::ExportToCsv | ToolName::ExportToJson => object_schema(
            &json!({
                "content_type": content_type_property(),
                "limit": {"type": "integer", "minimum": 1, "maximum": 100, "default": 100}
            }),
            &["content_type"],
        ),
        ToolName::SearchContent => object_schema(
            &json!({
                "query": {"type": "string", "minLength": 1},
                "content_type": content_type_property(),
                "limit": {"type": "integer", "minimum": 1, "maximum": 100, "default": 20}
            }),
            &["query"],
        ),
        ToolName::ResetRateLimits => object_schema(
            &json!({
                "client_key": {
                    "type": "string",
                    "pattern": "^[0-9a-f]{64}$",
                    "description": "Full client key; defaults to the caller."
                }
            }),
            &[],
        ),
        ToolName::GetImportStatus
        | ToolName::GetProtectedFields
        | ToolName::GetAccessStatus
        | ToolName::GetRateLimitStatus => object_schema(&json!({}), &[]),
    }
}

/// Returns the shared `content_type` property schema.
fn content_type_property() -> Value {
    json!({"type": "string", "minLength": 1, "description": "Content type machine name."})
}

/// Builds a closed object schema.
fn object_schema(properties: &Value, required: &[&str]) -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
