// mcp-tools-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared fixtures for governance integration tests.
// Purpose: Build limiters, clocks, and request contexts consistently.
// Dependencies: mcp-tools-core
// ============================================================================

#![allow(dead_code, reason = "Helpers are shared across test binaries.")]

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::sync::Arc;

use mcp_tools_core::ClientKey;
use mcp_tools_core::InMemoryStateStore;
use mcp_tools_core::ManualClock;
use mcp_tools_core::RateLimitPolicy;
use mcp_tools_core::RateLimiter;
use mcp_tools_core::RequestContext;

/// Fixed start time for simulated clocks.
pub const START: u64 = 1_700_000_000;

/// Builds a limiter over a fresh in-memory store and manual clock.
pub fn limiter(policy: RateLimitPolicy) -> (RateLimiter, Arc<InMemoryStateStore>, Arc<ManualClock>) {
    let store = Arc::new(InMemoryStateStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let limiter = RateLimiter::new(policy, store.clone(), clock.clone());
    (limiter, store, clock)
}

/// Returns an HTTP context for a loopback peer.
pub fn http_context() -> RequestContext {
    RequestContext::http(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)))
        .with_header("user-agent", "tests/1.0")
}

/// Returns the client key for [`http_context`].
pub fn client() -> ClientKey {
    ClientKey::derive(&http_context(), false)
}
