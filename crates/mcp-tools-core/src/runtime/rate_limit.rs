// mcp-tools-core/src/runtime/rate_limit.rs
// ============================================================================
// Module: Rate Limiter
// Description: Per-client fixed-window limits for writes and named reads.
// Purpose: Bound abuse of mutating and expensive tools per client.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! Every write-class call passes the global write counters (per minute and
//! per hour) plus the counter of its own operation type. Acquisitions are
//! delegated to [`StateStore::acquire`], which checks every counter and
//! increments them together or not at all.
//!
//! ## Invariants
//! - With rate limiting disabled, write checks never touch the store.
//! - A denied call increments nothing.
//! - Store failures deny the call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::context::RequestContext;
use crate::core::context::Transport;
use crate::core::envelope::ErrorCode;
use crate::core::hashing::sha256_hex;
use crate::core::window::WindowDenial;
use crate::core::window::WindowLimit;
use crate::core::window::WindowSize;
use crate::core::window::counter_name;
use crate::interfaces::AcquireOutcome;
use crate::interfaces::Clock;
use crate::interfaces::StateStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying an explicit client identifier.
pub const CLIENT_ID_HEADER: &str = "x-mcp-client-id";
/// Default writes per minute.
pub const DEFAULT_MAX_WRITES_PER_MINUTE: u64 = 30;
/// Default writes per hour.
pub const DEFAULT_MAX_WRITES_PER_HOUR: u64 = 500;
/// Default deletes per hour.
pub const DEFAULT_MAX_DELETES_PER_HOUR: u64 = 50;
/// Default structure changes per hour.
pub const DEFAULT_MAX_STRUCTURE_CHANGES_PER_HOUR: u64 = 100;
/// Read quota name for broken link scans.
pub const BROKEN_LINK_SCAN: &str = "broken_link_scan";
/// Read quota name for content searches.
pub const CONTENT_SEARCH: &str = "content_search";

/// Operation families reported in status usage.
const USAGE_OPERATIONS: [OperationType; 3] =
    [OperationType::Write, OperationType::Delete, OperationType::Structure];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Rate-limit bucket family of a write-class call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Generic write.
    Write,
    /// Deletion.
    Delete,
    /// Structural change (also used for admin calls).
    Structure,
}

impl OperationType {
    /// Normalizes an operation type name; `admin` maps to structure and
    /// unknown names map to write.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "delete" => Self::Delete,
            "structure" | "admin" => Self::Structure,
            _ => Self::Write,
        }
    }

    /// Returns the counter family name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Structure => "structure",
        }
    }
}

/// Named read quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadQuota {
    /// Maximum calls per window; non-positive is unlimited.
    pub max: i64,
    /// Window length.
    pub window: WindowSize,
}

/// Rate-limit configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Enables write-class limits.
    pub enabled: bool,
    /// Partition buckets by the `X-MCP-Client-Id` header.
    pub trust_client_id_header: bool,
    /// Writes per minute.
    pub max_writes_per_minute: u64,
    /// Writes per hour.
    pub max_writes_per_hour: u64,
    /// Deletes per hour.
    pub max_deletes_per_hour: u64,
    /// Structure changes per hour.
    pub max_structure_changes_per_hour: u64,
    /// Named read quotas.
    pub read_quotas: BTreeMap<String, ReadQuota>,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            trust_client_id_header: false,
            max_writes_per_minute: DEFAULT_MAX_WRITES_PER_MINUTE,
            max_writes_per_hour: DEFAULT_MAX_WRITES_PER_HOUR,
            max_deletes_per_hour: DEFAULT_MAX_DELETES_PER_HOUR,
            max_structure_changes_per_hour: DEFAULT_MAX_STRUCTURE_CHANGES_PER_HOUR,
            read_quotas: default_read_quotas(),
        }
    }
}

/// Returns the built-in read quotas.
#[must_use]
pub fn default_read_quotas() -> BTreeMap<String, ReadQuota> {
    BTreeMap::from([
        (BROKEN_LINK_SCAN.to_string(), ReadQuota {
            max: 10,
            window: WindowSize::Hour,
        }),
        (CONTENT_SEARCH.to_string(), ReadQuota {
            max: 30,
            window: WindowSize::Minute,
        }),
    ])
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitResult {
    /// Whether the call may proceed.
    pub allowed: bool,
    /// Denial message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Denial code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Seconds until retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl RateLimitResult {
    /// Builds an allow result.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            error: None,
            code: None,
            retry_after: None,
        }
    }

    /// Builds a deny result.
    #[must_use]
    pub fn deny(code: ErrorCode, error: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            allowed: false,
            error: Some(error.into()),
            code: Some(code),
            retry_after,
        }
    }
}

/// Configured write limits reported by status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitLimits {
    /// Writes per minute.
    pub writes_per_minute: u64,
    /// Writes per hour.
    pub writes_per_hour: u64,
    /// Deletes per hour.
    pub deletes_per_hour: u64,
    /// Structure changes per hour.
    pub structure_changes_per_hour: u64,
}

/// Live counts of one operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowUsage {
    /// Count in the current minute window.
    pub minute: u64,
    /// Count in the current hour window.
    pub hour: u64,
}

/// Rate-limit status for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    /// Whether write limits are enforced.
    pub enabled: bool,
    /// Truncated client key.
    pub client_id: String,
    /// Configured limits.
    pub limits: RateLimitLimits,
    /// Usage per operation family (empty when disabled).
    pub current_usage: BTreeMap<String, WindowUsage>,
}

// ============================================================================
// SECTION: Client Keys
// ============================================================================

/// Opaque per-client bucket key (SHA-256 hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Derives the key for a request.
    ///
    /// HTTP callers hash `ip:fingerprint`, or `ip:client_id:fingerprint` when
    /// the client-id header is trusted and non-empty. Stdio callers use the
    /// process key.
    #[must_use]
    pub fn derive(context: &RequestContext, trust_client_id_header: bool) -> Self {
        if context.transport == Transport::Stdio {
            return Self::for_process();
        }
        let ip = context.peer_ip.map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
        let fingerprint = format!(
            "{}:{}",
            context.header("user-agent").unwrap_or_default(),
            context.header("accept-language").unwrap_or_default()
        );
        let client_id = if trust_client_id_header {
            context.header(CLIENT_ID_HEADER).map(str::trim).unwrap_or_default()
        } else {
            ""
        };
        if client_id.is_empty() {
            Self(sha256_hex(&format!("{ip}:{fingerprint}")))
        } else {
            Self(sha256_hex(&format!("{ip}:{client_id}:{fingerprint}")))
        }
    }

    /// Returns the key for the current process (stdio transport).
    #[must_use]
    pub fn for_process() -> Self {
        Self(sha256_hex(&format!("cli:{}", std::process::id())))
    }

    /// Wraps a precomputed key.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the full key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first 12 characters followed by `...`.
    #[must_use]
    pub fn short(&self) -> String {
        let prefix: String = self.0.chars().take(12).collect();
        format!("{prefix}...")
    }
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Fixed-window rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    /// Configuration.
    policy: RateLimitPolicy,
    /// Window persistence.
    store: Arc<dyn StateStore + Send + Sync>,
    /// Time source.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl RateLimiter {
    /// Builds a rate limiter.
    #[must_use]
    pub fn new(
        policy: RateLimitPolicy,
        store: Arc<dyn StateStore + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            policy,
            store,
            clock,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Checks and records a write-class call.
    #[must_use]
    pub fn check_limit(&self, operation: OperationType, client: &ClientKey) -> RateLimitResult {
        if !self.policy.enabled {
            return RateLimitResult::allow();
        }
        let limits = self.write_limits(operation);
        let now = self.clock.now_unix_secs();
        match self.store.acquire(client.as_str(), &limits, now) {
            Ok(AcquireOutcome::Granted) => RateLimitResult::allow(),
            Ok(AcquireOutcome::Denied(denial)) => deny_for(&limits, denial),
            Err(err) => store_failure(&err),
        }
    }

    /// Records a permitted write-class call without checking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    pub fn increment(&self, operation: OperationType, client: &ClientKey) -> Result<(), StoreError> {
        if !self.policy.enabled {
            return Ok(());
        }
        let limits = self.write_limits(operation);
        self.store.record(client.as_str(), &limits, self.clock.now_unix_secs())
    }

    /// Checks and records a named read quota.
    ///
    /// Unknown names and non-positive limits are unlimited. Read quotas apply
    /// regardless of the `enabled` flag.
    #[must_use]
    pub fn check_read_limit(&self, operation: &str, client: &ClientKey) -> RateLimitResult {
        let name = operation.trim().to_ascii_lowercase();
        let Some(quota) = self.policy.read_quotas.get(&name) else {
            return RateLimitResult::allow();
        };
        let Ok(max) = u64::try_from(quota.max) else {
            return RateLimitResult::allow();
        };
        if max == 0 {
            return RateLimitResult::allow();
        }
        let limits = [WindowLimit::new(name, quota.window, Some(max))];
        match self.store.acquire(client.as_str(), &limits, self.clock.now_unix_secs()) {
            Ok(AcquireOutcome::Granted) => RateLimitResult::allow(),
            Ok(AcquireOutcome::Denied(denial)) => deny_for(&limits, denial),
            Err(err) => store_failure(&err),
        }
    }

    /// Reports limits and live usage for a client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    pub fn status(&self, client: &ClientKey) -> Result<RateLimitStatus, StoreError> {
        let mut current_usage = BTreeMap::new();
        if self.policy.enabled {
            let now = self.clock.now_unix_secs();
            for operation in USAGE_OPERATIONS {
                let mut usage = WindowUsage {
                    minute: 0,
                    hour: 0,
                };
                for window in [WindowSize::Minute, WindowSize::Hour] {
                    let counter = counter_name(operation.as_str(), window);
                    let count = self
                        .store
                        .load_window(client.as_str(), &counter)?
                        .map_or(0, |state| state.live_count(window, now));
                    match window {
                        WindowSize::Minute => usage.minute = count,
                        WindowSize::Hour => usage.hour = count,
                    }
                }
                current_usage.insert(operation.as_str().to_string(), usage);
            }
        }
        Ok(RateLimitStatus {
            enabled: self.policy.enabled,
            client_id: client.short(),
            limits: RateLimitLimits {
                writes_per_minute: self.policy.max_writes_per_minute,
                writes_per_hour: self.policy.max_writes_per_hour,
                deletes_per_hour: self.policy.max_deletes_per_hour,
                structure_changes_per_hour: self.policy.max_structure_changes_per_hour,
            },
            current_usage,
        })
    }

    /// Clears the write, delete, and structure counters for a client.
    ///
    /// Read quotas are left running so a reset cannot lift a scan budget.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be written.
    pub fn reset(&self, client: &ClientKey) -> Result<(), StoreError> {
        let counters: Vec<String> = USAGE_OPERATIONS
            .iter()
            .flat_map(|operation| {
                [WindowSize::Minute, WindowSize::Hour]
                    .map(|window| counter_name(operation.as_str(), window))
            })
            .collect();
        self.store.reset_counters(client.as_str(), &counters)
    }

    /// Builds the ordered counter list for a write-class operation.
    ///
    /// The global write counters come first; the operation's own counters
    /// follow so they are incremented alongside.
    fn write_limits(&self, operation: OperationType) -> Vec<WindowLimit> {
        let policy = &self.policy;
        let mut limits = vec![
            WindowLimit::new("write", WindowSize::Minute, Some(policy.max_writes_per_minute)),
            WindowLimit::new("write", WindowSize::Hour, Some(policy.max_writes_per_hour)),
        ];
        let own_hour_limit = match operation {
            OperationType::Write => return limits,
            OperationType::Delete => policy.max_deletes_per_hour,
            OperationType::Structure => policy.max_structure_changes_per_hour,
        };
        limits.push(WindowLimit::new(operation.as_str(), WindowSize::Hour, Some(own_hour_limit)));
        limits.push(WindowLimit::new(operation.as_str(), WindowSize::Minute, None));
        limits
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the denial result for an exhausted counter.
fn deny_for(limits: &[WindowLimit], denial: WindowDenial) -> RateLimitResult {
    let Some(limit) = limits.get(denial.index) else {
        return RateLimitResult::deny(ErrorCode::RateLimitExceeded, "Rate limit exceeded.", None);
    };
    let max = limit.limit.unwrap_or_default();
    let message = format!(
        "Rate limit exceeded: Maximum {max} {} operations per {}. Try again in {} seconds.",
        limit.operation,
        limit.window.label(),
        denial.retry_after
    );
    RateLimitResult::deny(ErrorCode::RateLimitExceeded, message, Some(denial.retry_after))
}

/// Builds the fail-closed result for a store failure.
fn store_failure(err: &StoreError) -> RateLimitResult {
    RateLimitResult::deny(ErrorCode::InternalError, format!("Rate limit check failed: {err}"), None)
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

    use std::net::IpAddr;
    use std::net::Ipv4Addr;

    use super::ClientKey;
    use super::OperationType;
    use crate::core::context::RequestContext;

    fn http(ip: u8) -> RequestContext {
        RequestContext::http(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, ip))))
            .with_header("User-Agent", "agent/1.0")
            .with_header("Accept-Language", "en")
    }

    #[test]
    fn operation_types_normalize() {
        assert_eq!(OperationType::parse(" ADMIN "), OperationType::Structure);
        assert_eq!(OperationType::parse("delete"), OperationType::Delete);
        assert_eq!(OperationType::parse("rename"), OperationType::Write);
    }

    #[test]
    fn untrusted_client_id_header_never_partitions() {
        let first = ClientKey::derive(&http(1).with_header("X-MCP-Client-Id", "alpha"), false);
        let second = ClientKey::derive(&http(1).with_header("X-MCP-Client-Id", "beta"), false);
        assert_eq!(first, second);
    }

    #[test]
    fn trusted_client_id_header_partitions() {
        let first = ClientKey::derive(&http(1).with_header("X-MCP-Client-Id", "alpha"), true);
        let second = ClientKey::derive(&http(1).with_header("X-MCP-Client-Id", "beta"), true);
        let bare = ClientKey::derive(&http(1), true);
        assert_ne!(first, second);
        assert_ne!(first, bare);
    }

    #[test]
    fn peers_get_distinct_keys() {
        assert_ne!(ClientKey::derive(&http(1), false), ClientKey::derive(&http(2), false));
    }

    #[test]
    fn stdio_uses_process_key() {
        assert_eq!(ClientKey::derive(&RequestContext::stdio(), true), ClientKey::for_process());
    }

    #[test]
    fn short_form_truncates() {
        let key = ClientKey::derive(&http(1), false);
        let short = key.short();
        assert_eq!(short.len(), 15);
        assert!(short.ends_with("..."));
    }
}
