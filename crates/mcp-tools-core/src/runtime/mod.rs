// mcp-tools-core/src/runtime/mod.rs
// ============================================================================
// Module: MCP Tools Runtime
// Description: Stateful governance services: rate limiting, audit, stores.
// Purpose: Implement the stateful half of request governance.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules hold the components that read or write shared state: the
//! fixed-window rate limiter, audit logging with its sinks, the in-memory
//! state store, and clocks.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod clock;
pub mod rate_limit;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditLogger;
pub use audit::AuditRecord;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::sanitize_details;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use rate_limit::ClientKey;
pub use rate_limit::OperationType;
pub use rate_limit::RateLimitPolicy;
pub use rate_limit::RateLimitResult;
pub use rate_limit::RateLimitStatus;
pub use rate_limit::RateLimiter;
pub use rate_limit::ReadQuota;
pub use store::InMemoryStateStore;
pub use store::SharedStateStore;
