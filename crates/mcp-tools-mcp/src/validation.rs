// mcp-tools-mcp/src/validation.rs
// ============================================================================
// Module: Tool Input Validation
// Description: JSON schema validation of tool arguments.
// Purpose: Reject malformed arguments before any governance or domain work.
// Dependencies: jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Every tool schema is compiled once when the router is built. Validation
//! fails closed: a tool without a compiled schema rejects all input.

use std::collections::BTreeMap;

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;

use crate::tooling::ToolName;
use crate::tooling::input_schema;

/// Maximum validation messages returned for one call.
pub const MAX_VALIDATION_ERRORS: usize = 10;

/// Compiled input schemas for every tool.
pub struct InputValidator {
    /// Validators keyed by tool.
    validators: BTreeMap<ToolName, Validator>,
}

impl InputValidator {
    /// Compiles the schema of every registered tool.
    ///
    /// # Errors
    ///
    /// Returns a message naming the tool whose schema failed to compile.
    pub fn new() -> Result<Self, String> {
        let mut validators = BTreeMap::new();
        for tool in ToolName::all() {
            let validator = compile_schema(&input_schema(*tool))
                .map_err(|err| format!("invalid input schema for {tool}: {err}"))?;
            validators.insert(*tool, validator);
        }
        Ok(Self {
            validators,
        })
    }

    /// Validates arguments for a tool.
    ///
    /// # Errors
    ///
    /// Returns up to [`MAX_VALIDATION_ERRORS`] messages describing violations.
    pub fn validate(&self, tool: ToolName, arguments: &Value) -> Result<(), Vec<String>> {
        let Some(validator) = self.validators.get(&tool) else {
            return Err(vec![format!("no input schema registered for {tool}")]);
        };
        let messages: Vec<String> = validator
            .iter_errors(arguments)
            .take(MAX_VALIDATION_ERRORS)
            .map(|error| error.to_string())
            .collect();
        if messages.is_empty() { Ok(()) } else { Err(messages) }
    }
}

/// Compiles a JSON schema for validation.
fn compile_schema(schema: &Value) -> Result<Validator, String> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| err.to_string())
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

    use serde_json::json;

    use super::InputValidator;
    use super::MAX_VALIDATION_ERRORS;
    use crate::tooling::ToolName;

    #[test]
    fn accepts_well_formed_arguments() {
        let validator = InputValidator::new().unwrap();
        let arguments = json!({"content_type": "page", "items": [{"title": "A"}]});
        assert!(validator.validate(ToolName::ImportFromJson, &arguments).is_ok());
        assert!(validator.validate(ToolName::GetAccessStatus, &json!({})).is_ok());
    }

    #[test]
    fn reports_missing_and_mistyped_fields() {
        let validator = InputValidator::new().unwrap();
        let errors = validator
            .validate(ToolName::ImportFromJson, &json!({"items": "nope"}))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|message| message.contains("content_type")));
        assert!(errors.iter().any(|message| message.contains("array")));
    }

    #[test]
    fn rejects_unknown_arguments() {
        let validator = InputValidator::new().unwrap();
        let result = validator.validate(ToolName::GetImportStatus, &json!({"force": true}));
        assert!(result.is_err());
    }

    #[test]
    fn caps_message_count() {
        let validator = InputValidator::new().unwrap();
        let items: Vec<_> = (0 .. 20).map(|index| json!(index)).collect();
        let errors = validator
            .validate(ToolName::ValidateImport, &json!({"content_type": "page", "items": items}))
            .unwrap_err();
        assert_eq!(errors.len(), MAX_VALIDATION_ERRORS);
    }
}
