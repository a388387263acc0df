// mcp-tools-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure policy checks for the CLI server launcher.
// Purpose: Enforce loopback-only HTTP binds unless explicitly opted in.
// Dependencies: mcp-tools-config, std
// ============================================================================

//! ## Overview
//! The HTTP transport binds to loopback by default. A non-loopback bind
//! requires `--allow-non-loopback` or `MCP_TOOLS_ALLOW_NON_LOOPBACK`, and the
//! launcher prints a banner summarizing the governance posture once exposed.

use std::env;
use std::fmt;
use std::net::SocketAddr;

use mcp_tools_config::AuditSinkType;
use mcp_tools_config::McpToolsConfig;
use mcp_tools_config::ServerTransport;

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "MCP_TOOLS_ALLOW_NON_LOOPBACK";

/// Bind outcome metadata for transport warnings.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    /// Selected transport.
    pub transport: ServerTransport,
    /// Bound socket address for the HTTP transport.
    pub bind_addr: Option<SocketAddr>,
    /// True when the server is bound to a non-loopback address.
    pub network_exposed: bool,
    /// Whether audit records reach a sink.
    pub audit_enabled: bool,
    /// Whether write-class rate limits are enforced.
    pub rate_limit_enabled: bool,
    /// Whether scopes are taken from the request header.
    pub header_scopes_trusted: bool,
}

/// Serve policy failures for bind safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServePolicyError {
    /// Environment variable was set to an invalid value.
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
}

impl fmt::Display for ServePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnv {
                value,
            } => write!(f, "{ALLOW_NON_LOOPBACK_ENV} has invalid value '{value}'"),
            Self::InvalidBind {
                bind,
                error,
            } => write!(f, "invalid bind address '{bind}': {error}"),
            Self::NonLoopbackOptInRequired {
                bind,
            } => write!(
                f,
                "refusing to bind {bind}: non-loopback binds require --allow-non-loopback or \
                 {ALLOW_NON_LOOPBACK_ENV}=1"
            ),
        }
    }
}

/// Resolves the non-loopback opt-in flag from CLI and environment.
///
/// # Errors
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is invalid.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    parse_allow_non_loopback_value(&value.to_string_lossy())
}

/// Enforces local-only transport restrictions for the MCP server.
///
/// # Errors
/// Returns [`ServePolicyError`] when the bind is invalid or not opted in.
pub fn enforce_local_only(
    config: &McpToolsConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let mut outcome = BindOutcome {
        transport: config.server.transport,
        bind_addr: None,
        network_exposed: false,
        audit_enabled: config.access.audit_logging && config.audit.sink != AuditSinkType::None,
        rate_limit_enabled: config.rate_limiting.enabled,
        header_scopes_trusted: config.access.trust_scopes_via_header,
    };
    match config.server.transport {
        ServerTransport::Stdio => Ok(outcome),
        ServerTransport::Http => {
            let bind = config.server.bind.as_deref().unwrap_or_default();
            let addr: SocketAddr = bind.parse().map_err(|err: std::net::AddrParseError| {
                ServePolicyError::InvalidBind {
                    bind: bind.to_string(),
                    error: err.to_string(),
                }
            })?;
            outcome.bind_addr = Some(addr);
            if addr.ip().is_loopback() {
                return Ok(outcome);
            }
            if !allow_non_loopback {
                return Err(ServePolicyError::NonLoopbackOptInRequired {
                    bind: bind.to_string(),
                });
            }
            outcome.network_exposed = true;
            Ok(outcome)
        }
    }
}

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an env value for allow-non-loopback.
fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).ok_or_else(|| ServePolicyError::InvalidEnv {
        value: value.to_string(),
    })
}
