// mcp-tools-migration/src/csv.rs
// ============================================================================
// Module: CSV Helpers
// Description: Minimal RFC 4180 style reading and escaping.
// Purpose: Parse CSV imports and render CSV exports.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Records are split on newlines outside quotes, then each record is split on
//! commas outside quotes. A doubled quote inside a quoted cell is a literal
//! quote. Trailing carriage returns are dropped so CRLF input parses the same
//! as LF input.

// ============================================================================
// SECTION: Reading
// ============================================================================

/// Splits CSV text into raw records, keeping quoted newlines.
///
/// A final empty record produced by a trailing newline is dropped.
#[must_use]
pub fn split_records(data: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in data.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '\n' if !in_quotes => {
                records.push(strip_cr(std::mem::take(&mut current)));
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        records.push(strip_cr(current));
    }
    records
}

/// Splits one record into cells, unquoting as needed.
#[must_use]
pub fn parse_record(record: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(ch),
        }
    }
    cells.push(cell);
    cells
}

/// Drops one trailing carriage return.
fn strip_cr(mut record: String) -> String {
    if record.ends_with('\r') {
        record.pop();
    }
    record
}

// ============================================================================
// SECTION: Writing
// ============================================================================

/// Quotes a cell when it contains a comma, quote, or newline.
#[must_use]
pub fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
