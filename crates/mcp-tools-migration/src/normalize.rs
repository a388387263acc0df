// mcp-tools-migration/src/normalize.rs
// ============================================================================
// Module: Import Normalization
// Description: Turns untyped import items into entity payloads.
// Purpose: Apply title/status extraction, field filtering, and coercion.
// Dependencies: mcp-tools-core, serde_json
// ============================================================================

//! ## Overview
//! An import item is an untyped map. Normalization pulls out the title and
//! publish status, then walks the remaining fields: empty values are skipped,
//! protected names are dropped (before and after `field_` prefix inference),
//! names the bundle does not define are ignored, and the survivors are
//! coerced to the shape their field type stores.
//!
//! ## Invariants
//! - `status`, `title`, and `name` never reach the field payload.
//! - A protected name is dropped silently, never reported as a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mcp_tools_core::ProtectedFieldFilter;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use serde_json::json;

use crate::content::ContentType;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Untyped import item.
pub type ImportItem = Map<String, Value>;

/// Keys consumed before field processing.
const RESERVED_KEYS: [&str; 3] = ["title", "name", "status"];

/// Result of title extraction for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    /// A usable title was supplied.
    Present(String),
    /// Neither key was supplied; the placeholder is used.
    Placeholder(String),
    /// A title key was supplied but blank.
    Blank,
}

impl TitleOutcome {
    /// Returns the title to store, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Present(title) | Self::Placeholder(title) => Some(title),
            Self::Blank => None,
        }
    }
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts the title from `title`, falling back to `name`.
///
/// `row` is 1-based and only used for the placeholder.
#[must_use]
pub fn extract_title(item: &ImportItem, row: usize) -> TitleOutcome {
    let supplied = ["title", "name"]
        .into_iter()
        .find_map(|key| item.get(key).filter(|value| !value.is_null()));
    let Some(value) = supplied else {
        return TitleOutcome::Placeholder(format!("Imported item {row}"));
    };
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    };
    if text.is_empty() { TitleOutcome::Blank } else { TitleOutcome::Present(text) }
}

/// Extracts the publish status; absent means unpublished.
#[must_use]
pub fn extract_status(item: &ImportItem) -> bool {
    item.get("status").is_some_and(truthy)
}

/// Returns true for values an import treats as "not supplied".
///
/// The string `"0"` and the integer `0` are meaningful and never empty.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(number) => number.as_i64().is_none() && number.as_f64() == Some(0.0),
    }
}

// ============================================================================
// SECTION: Field Resolution
// ============================================================================

/// Resolves a raw field name to the bundle field it targets.
///
/// Returns `None` when the name is protected (raw or after prefix inference)
/// or the bundle does not define the resolved name.
#[must_use]
pub fn resolve_field_name(
    raw: &str,
    content_type: &ContentType,
    filter: &ProtectedFieldFilter,
) -> Option<String> {
    if filter.is_protected(raw) {
        return None;
    }
    let mut name = raw.to_string();
    if !raw.starts_with("field_") && raw != "body" {
        let prefixed = format!("field_{raw}");
        if content_type.has_field(&prefixed) {
            name = prefixed;
        }
    }
    if filter.is_protected(&name) {
        return None;
    }
    content_type.has_field(&name).then_some(name)
}

/// Builds the field payload for one item.
#[must_use]
pub fn build_field_payload(
    item: &ImportItem,
    content_type: &ContentType,
    filter: &ProtectedFieldFilter,
) -> Map<String, Value> {
    let mut payload = Map::new();
    for (raw, value) in item {
        if RESERVED_KEYS.contains(&raw.as_str()) || is_empty_value(value) {
            continue;
        }
        let Some(name) = resolve_field_name(raw, content_type, filter) else {
            continue;
        };
        let field_type = content_type.field(&name).map_or("", |field| field.field_type.as_str());
        payload.insert(name, coerce_value(field_type, value.clone()));
    }
    payload
}

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Coerces a value to the storage shape of `field_type`.
#[must_use]
pub fn coerce_value(field_type: &str, value: Value) -> Value {
    let structured = value.is_object() || value.is_array();
    match field_type {
        "text_long" | "text_with_summary" if !structured => {
            json!({"value": value, "format": "basic_html"})
        }
        "entity_reference" | "image" | "file" if !structured => {
            json!({"target_id": to_int(&value)})
        }
        "link" if !structured => json!({"uri": value}),
        "datetime" if !structured => json!({"value": value}),
        "boolean" => Value::Bool(truthy(&value)),
        "integer" => Value::from(to_int(&value)),
        "decimal" | "float" => Number::from_f64(to_float(&value)).map_or(Value::Null, Value::Number),
        _ => value,
    }
}

/// Loose truthiness: zero, empty, `"0"`, and null are false.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !(text.is_empty() || text == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Loose integer conversion using the leading numeric prefix of strings.
#[must_use]
pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Bool(flag) => i64::from(*flag),
        Value::Number(number) => {
            number.as_i64().unwrap_or_else(|| truncate(number.as_f64().unwrap_or_default()))
        }
        Value::String(text) => truncate(leading_number(text)),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(_) => 1,
        Value::Null => 0,
    }
}

/// Loose float conversion using the leading numeric prefix of strings.
#[must_use]
pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Number(number) => number.as_f64().unwrap_or_default(),
        Value::String(text) => leading_number(text),
        Value::Array(items) => f64::from(u8::from(!items.is_empty())),
        Value::Object(_) => 1.0,
        Value::Null => 0.0,
    }
}

/// Parses the longest numeric prefix after leading whitespace.
fn leading_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while bytes.get(fraction_end).is_some_and(u8::is_ascii_digit) {
            fraction_end += 1;
        }
        if fraction_end > fraction_start || end > digits_start {
            end = fraction_end;
        }
    }
    if end > digits_start && matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    trimmed.get(.. end).and_then(|prefix| prefix.parse().ok()).unwrap_or(0.0)
}

/// Truncates toward zero, saturating at the `i64` bounds.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Saturating truncation toward zero is the intended conversion."
)]
fn truncate(value: f64) -> i64 {
    if value.is_nan() { 0 } else { value.trunc() as i64 }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
