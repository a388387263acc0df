// mcp-tools-mcp/tests/server_config.rs
// ============================================================================
// Module: Server Wiring Tests
// Description: Router construction from TOML configuration.
// Purpose: Validate backends, audit sinks, and seeds selected by config.
// Dependencies: mcp-tools-config, mcp-tools-core, mcp-tools-mcp, tempfile, toml
// ============================================================================
//! ## Overview
//! Router construction from TOML configuration.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::Path;

use mcp_tools_config::McpToolsConfig;
use mcp_tools_core::ErrorCode;
use mcp_tools_core::RequestContext;
use mcp_tools_mcp::McpServerError;
use mcp_tools_mcp::build_router;
use serde_json::Value;
use serde_json::json;

fn parse(text: &str) -> McpToolsConfig {
    toml::from_str(text).expect("parse config")
}

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[test]
fn sqlite_store_keeps_import_status_across_routers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("state.db");
    let config = parse(&format!(
        r#"
[access]
default_scopes = ["read", "write"]

[audit]
sink = "none"

[state_store]
type = "sqlite"
path = "{}"
"#,
        toml_path(&db)
    ));
    let context = RequestContext::stdio();

    let first = build_router(&config).expect("first router");
    let import = first
        .handle_tool_call(
            &context,
            "import_from_json",
            json!({"content_type": "page", "items": [{"title": "Kept"}]}),
        )
        .unwrap();
    assert!(import.success);
    let import_id = import.data.unwrap()["import_id"].clone();
    drop(first);

    let second = build_router(&config).expect("second router");
    let status = second.handle_tool_call(&context, "get_import_status", json!({})).unwrap();
    let data = status.data.unwrap();
    assert_eq!(data["import_id"], import_id);
    assert_eq!(data["total_items"], 1);
}

#[test]
fn file_audit_sink_records_denials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("audit.jsonl");
    let config = parse(&format!(
        r#"
[audit]
sink = "file"
path = "{}"
"#,
        toml_path(&log)
    ));
    let router = build_router(&config).expect("router");
    let response = router
        .handle_tool_call(
            &RequestContext::stdio(),
            "import_from_csv",
            json!({"content_type": "page", "csv_data": "title\nA"}),
        )
        .unwrap();
    assert_eq!(response.code, Some(ErrorCode::InsufficientScope));

    let text = fs::read_to_string(&log).expect("audit log");
    let lines: Vec<Value> =
        text.lines().map(|line| serde_json::from_str(line).expect("json line")).collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["action"], "import_from_csv");
    assert_eq!(lines[0]["success"], false);
}

#[test]
fn seed_file_defines_content_types() {
    let dir = tempfile::tempdir().expect("tempdir");
    let seed = dir.path().join("seed.json");
    fs::write(
        &seed,
        json!({
            "content_types": [{
                "id": "faq",
                "label": "FAQ",
                "fields": [
                    {"name": "title", "label": "Title", "field_type": "string", "required": true},
                    {"name": "field_answer", "label": "Answer", "field_type": "text_long"}
                ]
            }],
            "records": [{"content_type": "faq", "title": "Why?", "status": true}]
        })
        .to_string(),
    )
    .expect("write seed");
    let config = parse(&format!(
        r#"
[audit]
sink = "none"

[content]
seed_path = "{}"
"#,
        toml_path(&seed)
    ));
    let router = build_router(&config).expect("router");
    let context = RequestContext::stdio();

    let mapping = router
        .handle_tool_call(&context, "get_field_mapping", json!({"content_type": "faq"}))
        .unwrap();
    assert!(mapping.data.unwrap()["optional"].get("field_answer").is_some());

    let missing = router
        .handle_tool_call(&context, "get_field_mapping", json!({"content_type": "article"}))
        .unwrap();
    assert_eq!(missing.code, Some(ErrorCode::NotFound));
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = parse(
        r#"
[state_store]
type = "sqlite"
"#,
    );
    let result = build_router(&config);
    assert!(matches!(result, Err(McpServerError::Config(_))));
}
