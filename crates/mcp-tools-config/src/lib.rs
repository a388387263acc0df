// mcp-tools-config/src/lib.rs
// ============================================================================
// Module: MCP Tools Config Library
// Description: Canonical config model, validation, and policy conversion.
// Purpose: Single source of truth for mcp-tools.toml semantics.
// Dependencies: mcp-tools-core, mcp-tools-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `mcp-tools-config` defines the configuration model for the MCP tools
//! server. It validates limits and paths up front and converts the result
//! into the policy values consumed by the governance components.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
