// mcp-tools-mcp/tests/common/mod.rs
// ============================================================================
// Module: Tool Router Test Helpers
// Description: Router fixtures over in-memory stores and a manual clock.
// Purpose: Exercise the governance pipeline without transports.
// Dependencies: mcp-tools-core, mcp-tools-mcp, mcp-tools-migration
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeSet;
use std::sync::Arc;

use mcp_tools_core::AccessManager;
use mcp_tools_core::AccessPolicy;
use mcp_tools_core::Actor;
use mcp_tools_core::AuditLogger;
use mcp_tools_core::AuditRecord;
use mcp_tools_core::InMemoryStateStore;
use mcp_tools_core::ManualClock;
use mcp_tools_core::MemoryAuditSink;
use mcp_tools_core::ProtectedFieldFilter;
use mcp_tools_core::RateLimitPolicy;
use mcp_tools_core::RateLimiter;
use mcp_tools_core::RequestContext;
use mcp_tools_core::Scope;
use mcp_tools_core::ScopePolicy;
use mcp_tools_core::ScopeResolver;
use mcp_tools_core::ToolResponse;
use mcp_tools_mcp::ToolRouter;
use mcp_tools_mcp::ToolRouterConfig;
use mcp_tools_migration::InMemoryContentStore;
use mcp_tools_migration::MigrationService;
use serde_json::Value;

/// Fixed clock time: 2023-11-14T22:13:20Z.
pub const NOW: u64 = 1_700_000_000;

/// Governance knobs for one router.
pub struct Policies {
    pub scopes: ScopePolicy,
    pub access: AccessPolicy,
    pub rate: RateLimitPolicy,
}

impl Policies {
    /// Grants the given default scopes with no ceiling override.
    pub fn with_scopes(scopes: &[Scope]) -> Self {
        Self {
            scopes: ScopePolicy {
                default_scopes: Some(scopes.iter().copied().collect()),
                allowed_scopes: Some(scopes.iter().copied().collect()),
                ..ScopePolicy::default()
            },
            access: AccessPolicy::default(),
            rate: RateLimitPolicy::default(),
        }
    }

    /// Grants every scope.
    pub fn full() -> Self {
        Self::with_scopes(Scope::all())
    }
}

/// Router plus handles to its backing stores.
pub struct Harness {
    pub router: ToolRouter,
    pub audit: Arc<MemoryAuditSink>,
    pub content: InMemoryContentStore,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Calls a tool and returns the envelope.
    pub fn call(&self, context: &RequestContext, name: &str, arguments: Value) -> ToolResponse {
        self.router.handle_tool_call(context, name, arguments).expect("tool call")
    }

    /// Returns every audit record so far.
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit.records()
    }
}

/// Builds a router over the standard bundles.
pub fn harness(policies: Policies) -> Harness {
    let content = InMemoryContentStore::with_standard_types();
    let state = Arc::new(InMemoryStateStore::new());
    let clock = Arc::new(ManualClock::new(NOW));
    let audit = Arc::new(MemoryAuditSink::new());
    let filter = ProtectedFieldFilter::builtin().expect("builtin filter");
    let migration = MigrationService::new(
        Arc::new(content.clone()),
        state.clone(),
        Arc::new(filter),
        clock.clone(),
    );
    let router = ToolRouter::new(ToolRouterConfig {
        scopes: ScopeResolver::new(&policies.scopes),
        access: AccessManager::new(&policies.access),
        rate_limiter: RateLimiter::new(policies.rate, state, clock.clone()),
        audit: AuditLogger::new(true, audit.clone(), clock.clone()),
        migration,
    })
    .expect("router");
    Harness {
        router,
        audit,
        content,
        clock,
    }
}

/// Stdio context acting as a named editor.
pub fn stdio() -> RequestContext {
    RequestContext::stdio().with_actor(Actor::new("7", "editor"))
}

/// HTTP context from a loopback peer.
pub fn http() -> RequestContext {
    RequestContext::http(Some([127, 0, 0, 1].into()))
        .with_actor(Actor::new("7", "editor"))
        .with_header("user-agent", "suite/1.0")
}

/// Builds a scope set.
pub fn scopes(list: &[Scope]) -> BTreeSet<Scope> {
    list.iter().copied().collect()
}
