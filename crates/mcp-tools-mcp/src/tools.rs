// mcp-tools-mcp/src/tools.rs
// ============================================================================
// Module: Tool Router
// Description: Governance pipeline and dispatch for MCP tool calls.
// Purpose: Route every tool call through validation, access, and rate checks.
// Dependencies: mcp-tools-core, mcp-tools-migration, serde, serde_json
// ============================================================================

//! ## Overview
//! [`ToolRouter`] is the single entry point for tool calls. Each call runs
//! the same pipeline: input schema validation, scope resolution, access
//! check, rate limit or read quota, dispatch, audit, and the uniform
//! [`ToolResponse`] envelope. Tool-level failures are envelopes; only an
//! unknown tool or a serialization fault surfaces as [`ToolError`].
//!
//! ## Invariants
//! - Denials short-circuit before the domain operation runs.
//! - Every denial is audited; write and admin outcomes are audited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use mcp_tools_core::AccessManager;
use mcp_tools_core::AuditLogger;
use mcp_tools_core::ClientKey;
use mcp_tools_core::ErrorCode;
use mcp_tools_core::Operation;
use mcp_tools_core::RateLimitResult;
use mcp_tools_core::RateLimiter;
use mcp_tools_core::RequestContext;
use mcp_tools_core::ScopeResolver;
use mcp_tools_core::ToolResponse;
use mcp_tools_core::wrap_error;
use mcp_tools_migration::ImportItem;
use mcp_tools_migration::MAX_EXPORT_ITEMS;
use mcp_tools_migration::MigrationError;
use mcp_tools_migration::MigrationService;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::tooling::RateClass;
use crate::tooling::ToolDefinition;
use crate::tooling::ToolName;
use crate::tooling::tool_definitions;
use crate::validation::InputValidator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Detail keys copied from a successful result into the audit record.
const AUDITED_RESULT_KEYS: [&str; 6] =
    ["import_id", "content_type", "total_items", "created_count", "failed_count", "client_id"];

// ============================================================================
// SECTION: Tool Router
// ============================================================================

/// Tool router for MCP requests.
#[derive(Clone)]
pub struct ToolRouter {
    /// Effective scope resolution.
    scopes: ScopeResolver,
    /// Access rules.
    access: AccessManager,
    /// Per-client rate limiter.
    rate_limiter: RateLimiter,
    /// Audit logger for governed operations.
    audit: AuditLogger,
    /// Content migration service.
    migration: MigrationService,
    /// Compiled input schemas.
    validator: Arc<InputValidator>,
}

/// Configuration inputs for building a tool router.
pub struct ToolRouterConfig {
    /// Effective scope resolution.
    pub scopes: ScopeResolver,
    /// Access rules.
    pub access: AccessManager,
    /// Per-client rate limiter.
    pub rate_limiter: RateLimiter,
    /// Audit logger for governed operations.
    pub audit: AuditLogger,
    /// Content migration service.
    pub migration: MigrationService,
}

impl ToolRouter {
    /// Creates a new tool router.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Internal`] when a tool schema fails to compile.
    pub fn new(config: ToolRouterConfig) -> Result<Self, ToolError> {
        let validator = InputValidator::new().map_err(ToolError::Internal)?;
        Ok(Self {
            scopes: config.scopes,
            access: config.access,
            rate_limiter: config.rate_limiter,
            audit: config.audit,
            migration: config.migration,
            validator: Arc::new(validator),
        })
    }

    /// Lists the MCP tools supported by this server.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Handles a tool call by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the name is not registered.
    pub fn handle_tool_call(
        &self,
        context: &RequestContext,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResponse, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let arguments = if arguments.is_null() { Value::Object(Map::new()) } else { arguments };
        if let Err(messages) = self.validator.validate(tool, &arguments) {
            return Ok(ToolResponse::failure(
                ErrorCode::ValidationError,
                format!("Invalid input for {tool}."),
            )
            .with_validation_errors(messages.into_iter().map(Value::String).collect()));
        }

        let spec = tool.spec();
        let client = ClientKey::derive(context, self.rate_limiter.policy().trust_client_id_header);
        let (resource_type, resource_id) = audit_resource(tool, &arguments, &client);

        let resolved = self.scopes.resolve(context);
        let decision =
            self.access.check_access(&resolved.scopes, spec.operation, Some(spec.write_kind()));
        if !decision.allowed {
            let code = decision.code.unwrap_or(ErrorCode::AccessDenied);
            let reason = decision.reason.unwrap_or_else(|| "Access denied.".to_string());
            self.audit_denial(context, tool, resource_type, &resource_id, code, &reason);
            return Ok(ToolResponse::failure(code, reason));
        }

        let limit = match spec.rate {
            RateClass::None => RateLimitResult::allow(),
            RateClass::Write(operation) => self.rate_limiter.check_limit(operation, &client),
            RateClass::ReadQuota(quota) => self.rate_limiter.check_read_limit(quota, &client),
        };
        if !limit.allowed {
            let code = limit.code.unwrap_or(ErrorCode::RateLimitExceeded);
            let error = limit.error.unwrap_or_else(|| "Rate limit exceeded.".to_string());
            self.audit_denial(context, tool, resource_type, &resource_id, code, &error);
            return Ok(ToolResponse::failure(code, error).with_retry_after(limit.retry_after));
        }

        let outcome = self.dispatch(tool, context, &client, arguments);
        if spec.operation != Operation::Read {
            let (details, success) = match &outcome {
                Ok(data) => (audited_result(data), true),
                Err(failure) => (json!({"code": failure.code, "error": failure.message}), false),
            };
            self.audit.log(context, tool.as_str(), resource_type, &resource_id, &details, success);
        }
        Ok(match outcome {
            Ok(data) => ToolResponse::success(data),
            Err(failure) => ToolResponse::failure(failure.code, failure.message),
        })
    }

    /// Records a governance denial.
    fn audit_denial(
        &self,
        context: &RequestContext,
        tool: ToolName,
        resource_type: &str,
        resource_id: &str,
        code: ErrorCode,
        reason: &str,
    ) {
        let details = json!({"code": code, "reason": reason});
        self.audit.log_failure(context, tool.as_str(), resource_type, resource_id, &details);
    }

    /// Runs the domain operation of a tool.
    fn dispatch(
        &self,
        tool: ToolName,
        context: &RequestContext,
        client: &ClientKey,
        arguments: Value,
    ) -> Result<Value, CallFailure> {
        match tool {
            ToolName::ImportFromJson => {
                let request: ImportJsonRequest = decode(tool, arguments)?;
                let report = self.migration.import_from_json(
                    &request.content_type,
                    &request.items,
                    &context.actor,
                )?;
                to_data(&report)
            }
            ToolName::ImportFromCsv => {
                let request: ImportCsvRequest = decode(tool, arguments)?;
                let report = self.migration.import_from_csv(
                    &request.content_type,
                    &request.csv_data,
                    &request.field_mapping,
                    &context.actor,
                )?;
                to_data(&report)
            }
            ToolName::ValidateImport => {
                let request: ImportJsonRequest = decode(tool, arguments)?;
                to_data(&self.migration.validate_import(&request.content_type, &request.items)?)
            }
            ToolName::GetFieldMapping => {
                let request: ContentTypeRequest = decode(tool, arguments)?;
                to_data(&self.migration.get_field_mapping(&request.content_type)?)
            }
            ToolName::ExportToCsv => {
                let request: ExportRequest = decode(tool, arguments)?;
                to_data(&self.migration.export_to_csv(&request.content_type, request.limit())?)
            }
            ToolName::ExportToJson => {
                let request: ExportRequest = decode(tool, arguments)?;
                to_data(&self.migration.export_to_json(&request.content_type, request.limit())?)
            }
            ToolName::GetImportStatus => to_data(&self.migration.get_import_status()?),
            ToolName::GetProtectedFields => to_data(&self.migration.protected_fields().describe()),
            ToolName::GetAccessStatus => {
                let resolved = self.scopes.resolve(context);
                let mut data = to_data(&self.access.status(&resolved.scopes))?;
                if let Value::Object(map) = &mut data {
                    map.insert("scope_source".to_string(), to_data(&resolved.source)?);
                }
                Ok(data)
            }
            ToolName::GetRateLimitStatus => {
                let status = self.rate_limiter.status(client).map_err(|err| {
                    CallFailure::new(
                        ErrorCode::InternalError,
                        wrap_error("Rate limit status failed", err),
                    )
                })?;
                to_data(&status)
            }
            ToolName::SearchContent => {
                let request: SearchRequest = decode(tool, arguments)?;
                let results = self.migration.search_content(
                    &request.query,
                    request.content_type.as_deref(),
                    request.limit,
                )?;
                to_data(&results)
            }
            ToolName::ResetRateLimits => {
                let request: ResetRequest = decode(tool, arguments)?;
                let target = request.client_key.map_or_else(|| client.clone(), ClientKey::from_raw);
                self.rate_limiter.reset(&target).map_err(|err| {
                    CallFailure::new(
                        ErrorCode::InternalError,
                        wrap_error("Rate limit reset failed", err),
                    )
                })?;
                Ok(json!({
                    "client_id": target.short(),
                    "message": "Rate limits reset."
                }))
            }
        }
    }
}

// ============================================================================
// SECTION: Tool Requests
// ============================================================================

/// Arguments of `import_from_json` and `validate_import`.
#[derive(Debug, Deserialize)]
struct ImportJsonRequest {
    /// Target bundle.
    content_type: String,
    /// Items to import.
    items: Vec<ImportItem>,
}

/// Arguments of `import_from_csv`.
#[derive(Debug, Deserialize)]
struct ImportCsvRequest {
    /// Target bundle.
    content_type: String,
    /// CSV text.
    csv_data: String,
    /// Header remapping.
    #[serde(default)]
    field_mapping: BTreeMap<String, String>,
}

/// Arguments naming a content type.
#[derive(Debug, Deserialize)]
struct ContentTypeRequest {
    /// Bundle machine name.
    content_type: String,
}

/// Arguments of the export tools.
#[derive(Debug, Deserialize)]
struct ExportRequest {
    /// Bundle machine name.
    content_type: String,
    /// Maximum items.
    #[serde(default)]
    limit: Option<usize>,
}

impl ExportRequest {
    /// Returns the requested limit or the export ceiling.
    fn limit(&self) -> usize {
        self.limit.unwrap_or(MAX_EXPORT_ITEMS)
    }
}

/// Arguments of `search_content`.
#[derive(Debug, Deserialize)]
struct SearchRequest {
    /// Title substring.
    query: String,
    /// Optional bundle filter.
    #[serde(default)]
    content_type: Option<String>,
    /// Maximum results.
    #[serde(default)]
    limit: Option<usize>,
}

/// Arguments of `reset_rate_limits`.
#[derive(Debug, Deserialize)]
struct ResetRequest {
    /// Client key to reset; defaults to the caller.
    #[serde(default)]
    client_key: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Tool payload serialization failed.
    #[error("serialization failure")]
    Serialization,
    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Tool-level failure rendered as an envelope.
#[derive(Debug)]
struct CallFailure {
    /// Envelope code.
    code: ErrorCode,
    /// Envelope message.
    message: String,
}

impl CallFailure {
    /// Builds a failure.
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<MigrationError> for CallFailure {
    fn from(error: MigrationError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes tool arguments into a typed request.
fn decode<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, CallFailure> {
    serde_json::from_value(arguments).map_err(|err| {
        let context = format!("Invalid input for {tool}");
        CallFailure::new(ErrorCode::ValidationError, wrap_error(&context, err))
    })
}

/// Serializes a tool result.
fn to_data<T: Serialize>(value: &T) -> Result<Value, CallFailure> {
    serde_json::to_value(value).map_err(|err| {
        CallFailure::new(ErrorCode::InternalError, wrap_error("Result serialization failed", err))
    })
}

/// Returns the audit resource type and identifier of a call.
fn audit_resource(tool: ToolName, arguments: &Value, client: &ClientKey) -> (&'static str, String) {
    match tool {
        ToolName::ResetRateLimits => {
            let target = arguments
                .get("client_key")
                .and_then(Value::as_str)
                .map_or_else(|| client.short(), |key| ClientKey::from_raw(key).short());
            ("rate_limit", target)
        }
        ToolName::SearchContent => ("content", "search".to_string()),
        _ => match arguments.get("content_type").and_then(Value::as_str) {
            Some(content_type) => ("content_type", content_type.to_string()),
            None => ("governance", tool.as_str().to_string()),
        },
    }
}

/// Picks the audited keys from a successful result.
fn audited_result(data: &Value) -> Value {
    let mut details = Map::new();
    for key in AUDITED_RESULT_KEYS {
        if let Some(value) = data.get(key) {
            details.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(details)
}
