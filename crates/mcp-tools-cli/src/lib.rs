// mcp-tools-cli/src/lib.rs
// ============================================================================
// Module: MCP Tools CLI Library
// Description: Shared helpers for the MCP tools command-line interface.
// Purpose: Keep launcher policy testable outside the binary entry point.
// Dependencies: mcp-tools-config
// ============================================================================

//! ## Overview
//! Houses the serve policy used by `mcp-tools serve` to decide whether the
//! HTTP transport may bind a non-loopback address.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod serve_policy;
