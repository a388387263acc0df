// mcp-tools-core/src/core/mod.rs
// ============================================================================
// Module: MCP Tools Core Types
// Description: Governance types shared by every MCP tool invocation.
// Purpose: Provide stable, serializable types for scopes, access, and windows.
// Dependencies: regex, serde, sha2
// ============================================================================

//! ## Overview
//! Core types define scopes, access decisions, request context, response
//! envelopes, protected-field rules, and the fixed-window arithmetic used by
//! rate limiting. These types are the canonical source of truth for the MCP
//! surface and the state stores.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod context;
pub mod envelope;
pub mod hashing;
pub mod import_status;
pub mod protected_fields;
pub mod scope;
pub mod window;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessDecision;
pub use access::AccessManager;
pub use access::AccessPolicy;
pub use access::AccessStatus;
pub use access::Operation;
pub use access::WriteKind;
pub use context::Actor;
pub use context::RequestContext;
pub use context::Transport;
pub use envelope::ErrorCode;
pub use envelope::ToolResponse;
pub use envelope::wrap_error;
pub use hashing::hex_encode;
pub use hashing::sha256_hex;
pub use import_status::ImportState;
pub use import_status::ImportStatus;
pub use protected_fields::PROTECTED_FIELDS_NOTE;
pub use protected_fields::ProtectedFieldError;
pub use protected_fields::ProtectedFieldFilter;
pub use protected_fields::ProtectedFieldRules;
pub use protected_fields::ProtectedFieldsReport;
pub use scope::ResolvedScopes;
pub use scope::Scope;
pub use scope::ScopePolicy;
pub use scope::ScopeResolver;
pub use scope::ScopeSet;
pub use scope::ScopeSource;
pub use window::MAX_WINDOW_SECS;
pub use window::WindowDenial;
pub use window::WindowLimit;
pub use window::WindowSize;
pub use window::WindowState;
pub use window::counter_name;
pub use window::plan_acquire;
pub use window::plan_record;
