// mcp-tools-core/src/core/context.rs
// ============================================================================
// Module: Request Context
// Description: Per-request context passed through the governance chain.
// Purpose: Carry actor identity, peer address, headers, and query explicitly.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`RequestContext`] replaces ambient request and session lookups. Transports
//! build one per call and every governance component reads from it instead
//! of global state. Header names are stored lowercase.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Transport used by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Content-Length framed JSON-RPC over stdin/stdout.
    Stdio,
    /// JSON-RPC over HTTP POST.
    Http,
}

/// Identity recorded in audit records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    /// Stable actor identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Actor {
    /// Builds an actor from identifier and name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Returns the anonymous actor.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("0", "anonymous")
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Per-request context used for scope, rate limit, and audit decisions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Transport used by the caller.
    pub transport: Transport,
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Request headers keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Query parameters.
    pub query: BTreeMap<String, String>,
    /// `MCP_SCOPE` value captured by the stdio transport.
    pub env_scope: Option<String>,
    /// Actor performing the request.
    pub actor: Actor,
    /// Optional request identifier for auditing.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds a stdio request context.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            transport: Transport::Stdio,
            peer_ip: None,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            env_scope: None,
            actor: Actor::anonymous(),
            request_id: None,
        }
    }

    /// Builds an HTTP request context.
    #[must_use]
    pub fn http(peer_ip: Option<IpAddr>) -> Self {
        Self {
            transport: Transport::Http,
            peer_ip,
            ..Self::stdio()
        }
    }

    /// Returns a copy with a header set (name is lowercased).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a copy with a query parameter set.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Returns a copy with the captured environment scope set.
    #[must_use]
    pub fn with_env_scope(mut self, value: impl Into<String>) -> Self {
        self.env_scope = Some(value.into());
        self
    }

    /// Returns a copy with the actor set.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns a query parameter value.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}
