// mcp-tools-core/src/core/envelope.rs
// ============================================================================
// Module: Tool Response Envelope
// Description: Uniform success/failure envelope and stable error codes.
// Purpose: Give MCP clients a decodable result with machine-readable codes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every tool call returns a [`ToolResponse`]: `{success, data?, error?,
//! code?, retry_after?, validation_errors?}`. Failures never escape as
//! transport faults; they are converted into this envelope with a stable
//! [`ErrorCode`] so clients can branch programmatically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced identifier does not exist.
    NotFound,
    /// Identifier is already taken.
    AlreadyExists,
    /// Input failed validation.
    ValidationError,
    /// Generic access denial.
    AccessDenied,
    /// Entity is protected from modification.
    EntityProtected,
    /// Entity is referenced elsewhere.
    EntityInUse,
    /// A required dependency is missing.
    MissingDependency,
    /// Rate limit exhausted for the current window.
    RateLimitExceeded,
    /// Site is in read-only mode.
    ReadOnlyMode,
    /// Write kind is blocked by config-only mode.
    ConfigOnlyMode,
    /// Connection lacks the required scope.
    InsufficientScope,
    /// Unexpected internal failure.
    InternalError,
    /// Tool execution raised an error.
    ExecutionFailed,
    /// Tool name is not registered.
    InvalidTool,
}

impl ErrorCode {
    /// Returns the canonical string form of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::EntityProtected => "ENTITY_PROTECTED",
            Self::EntityInUse => "ENTITY_IN_USE",
            Self::MissingDependency => "MISSING_DEPENDENCY",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ReadOnlyMode => "READ_ONLY_MODE",
            Self::ConfigOnlyMode => "CONFIG_ONLY_MODE",
            Self::InsufficientScope => "INSUFFICIENT_SCOPE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::InvalidTool => "INVALID_TOOL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Uniform tool response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error code on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Seconds until a rate-limited call may be retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// Structured validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<Value>>,
}

impl ToolResponse {
    /// Builds a successful response.
    #[must_use]
    pub const fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            retry_after: None,
            validation_errors: None,
        }
    }

    /// Builds a failed response.
    #[must_use]
    pub fn failure(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            code: Some(code),
            retry_after: None,
            validation_errors: None,
        }
    }

    /// Returns a copy with `retry_after` set.
    #[must_use]
    pub const fn with_retry_after(mut self, retry_after: Option<u64>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Returns a copy with validation errors attached.
    #[must_use]
    pub fn with_validation_errors(mut self, errors: Vec<Value>) -> Self {
        self.validation_errors = Some(errors);
        self
    }
}

/// Wraps an error message with call-site context as `"<context>: <message>"`.
#[must_use]
pub fn wrap_error(context: &str, error: impl fmt::Display) -> String {
    format!("{context}: {error}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
