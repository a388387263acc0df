// mcp-tools-core/src/lib.rs
// ============================================================================
// Module: MCP Tools Core Library
// Description: Public API surface for the MCP Tools governance core.
// Purpose: Expose scope, access, rate limiting, audit, and store primitives.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! MCP Tools core provides the request-governance layer shared by every tool
//! invocation: scope resolution, access decisions, protected-field filtering,
//! fixed-window rate limiting, and audit logging. It is transport-agnostic and
//! integrates through explicit interfaces ([`StateStore`], [`AuditSink`],
//! [`Clock`]) rather than global state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AcquireOutcome;
pub use interfaces::Clock;
pub use interfaces::StateStore;
pub use interfaces::StoreError;
pub use runtime::AuditLogger;
pub use runtime::AuditRecord;
pub use runtime::AuditSink;
pub use runtime::ClientKey;
pub use runtime::FileAuditSink;
pub use runtime::InMemoryStateStore;
pub use runtime::ManualClock;
pub use runtime::MemoryAuditSink;
pub use runtime::NoopAuditSink;
pub use runtime::OperationType;
pub use runtime::RateLimitPolicy;
pub use runtime::RateLimitResult;
pub use runtime::RateLimitStatus;
pub use runtime::RateLimiter;
pub use runtime::ReadQuota;
pub use runtime::SharedStateStore;
pub use runtime::StderrAuditSink;
pub use runtime::SystemClock;
pub use runtime::sanitize_details;
