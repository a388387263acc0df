// mcp-tools-mcp/src/lib.rs
// ============================================================================
// Module: MCP Tools MCP
// Description: MCP server and governed tool router.
// Purpose: Expose content migration tools over JSON-RPC behind governance.
// Dependencies: mcp-tools-core, mcp-tools-migration, axum, jsonschema, tokio
// ============================================================================

//! ## Overview
//! `mcp-tools-mcp` registers the content tools, validates their input
//! against JSON schemas, and routes every call through scope resolution,
//! access checks, rate limits, and audit logging before it reaches
//! [`mcp_tools_migration::MigrationService`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod server;
pub mod tooling;
pub mod tools;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use server::McpServer;
pub use server::McpServerError;
pub use server::build_router;
pub use server::stdio_context;
pub use tooling::RateClass;
pub use tooling::ToolDefinition;
pub use tooling::ToolName;
pub use tooling::ToolSpec;
pub use tooling::tool_definitions;
pub use tools::ToolError;
pub use tools::ToolRouter;
pub use tools::ToolRouterConfig;
pub use validation::InputValidator;
