// mcp-tools-core/src/core/protected_fields.rs
// ============================================================================
// Module: Protected Fields
// Description: Blocklist of fields that imports may never set.
// Purpose: Strip ownership, system, and routing fields from imported items.
// Dependencies: regex, serde, thiserror
// ============================================================================

//! ## Overview
//! The filter matches normalized (trimmed, lowercase) field names against an
//! exact-name set and a list of anchored regular expressions. Matches are
//! dropped silently by the importer rather than rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field names that can never be imported.
pub const PROTECTED_FIELDS: &[&str] = &[
    "uid",
    "revision_uid",
    "nid",
    "vid",
    "uuid",
    "type",
    "langcode",
    "created",
    "changed",
    "revision_timestamp",
    "status",
    "moderation_state",
    "content_translation_source",
    "content_translation_outdated",
    "path",
];

/// Field name patterns that can never be imported.
pub const PROTECTED_FIELD_PATTERNS: &[&str] = &["^revision_", "^content_translation_"];

/// Note attached to the protected field report.
pub const PROTECTED_FIELDS_NOTE: &str = "These fields cannot be set via import for security reasons.";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building a protected field filter.
#[derive(Debug, Error)]
pub enum ProtectedFieldError {
    /// A configured pattern is not a valid regular expression.
    #[error("invalid protected field pattern {pattern}: {message}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Additional protected fields supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedFieldRules {
    /// Extra exact field names.
    pub extra_fields: Vec<String>,
    /// Extra regex patterns.
    pub extra_patterns: Vec<String>,
}

/// Serializable description of the active rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectedFieldsReport {
    /// Exact field names.
    pub fields: Vec<String>,
    /// Regex patterns.
    pub patterns: Vec<String>,
    /// Explanation for clients.
    pub note: String,
}

/// Matches field names against the protected blocklist.
#[derive(Debug, Clone)]
pub struct ProtectedFieldFilter {
    /// Exact names in listing order.
    fields: Vec<String>,
    /// Exact names for lookup.
    lookup: BTreeSet<String>,
    /// Compiled patterns.
    patterns: Vec<Regex>,
}

impl ProtectedFieldFilter {
    /// Builds the filter from the built-in list plus configured extras.
    ///
    /// # Errors
    ///
    /// Returns [`ProtectedFieldError::InvalidPattern`] when a pattern fails to
    /// compile.
    pub fn new(rules: &ProtectedFieldRules) -> Result<Self, ProtectedFieldError> {
        let mut fields: Vec<String> = Vec::new();
        let mut lookup = BTreeSet::new();
        let extra = rules.extra_fields.iter().map(|name| normalize(name));
        for name in PROTECTED_FIELDS.iter().map(|name| (*name).to_string()).chain(extra) {
            if !name.is_empty() && lookup.insert(name.clone()) {
                fields.push(name);
            }
        }
        let mut patterns = Vec::new();
        let extra_patterns = rules.extra_patterns.iter().map(String::as_str);
        for pattern in PROTECTED_FIELD_PATTERNS.iter().copied().chain(extra_patterns) {
            let compiled = Regex::new(pattern).map_err(|err| ProtectedFieldError::InvalidPattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?;
            patterns.push(compiled);
        }
        Ok(Self {
            fields,
            lookup,
            patterns,
        })
    }

    /// Builds the filter with only the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns [`ProtectedFieldError`] when a built-in pattern fails to compile.
    pub fn builtin() -> Result<Self, ProtectedFieldError> {
        Self::new(&ProtectedFieldRules::default())
    }

    /// Returns true when the field may not be imported.
    #[must_use]
    pub fn is_protected(&self, field_name: &str) -> bool {
        let name = normalize(field_name);
        self.lookup.contains(&name) || self.patterns.iter().any(|pattern| pattern.is_match(&name))
    }

    /// Describes the active rules.
    #[must_use]
    pub fn describe(&self) -> ProtectedFieldsReport {
        ProtectedFieldsReport {
            fields: self.fields.clone(),
            patterns: self.patterns.iter().map(|pattern| format!("/{}/", pattern.as_str())).collect(),
            note: PROTECTED_FIELDS_NOTE.to_string(),
        }
    }
}

/// Normalizes a field name for matching.
fn normalize(field_name: &str) -> String {
    field_name.trim().to_lowercase()
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

    use super::ProtectedFieldError;
    use super::ProtectedFieldFilter;
    use super::ProtectedFieldRules;

    #[test]
    fn builtin_names_match_after_normalization() {
        let filter = ProtectedFieldFilter::builtin().unwrap();
        assert!(filter.is_protected("UID"));
        assert!(filter.is_protected(" revision_uid "));
        assert!(filter.is_protected("Status"));
        assert!(!filter.is_protected("field_title"));
        assert!(!filter.is_protected("body"));
    }

    #[test]
    fn patterns_cover_prefixed_families() {
        let filter = ProtectedFieldFilter::builtin().unwrap();
        assert!(filter.is_protected("content_translation_source"));
        assert!(filter.is_protected("content_translation_uid"));
        assert!(filter.is_protected("revision_log"));
        assert!(!filter.is_protected("field_revision_note"));
    }

    #[test]
    fn extra_rules_extend_builtins() {
        let filter = ProtectedFieldFilter::new(&ProtectedFieldRules {
            extra_fields: vec![" Promote ".to_string()],
            extra_patterns: vec!["^field_internal_".to_string()],
        })
        .unwrap();
        assert!(filter.is_protected("promote"));
        assert!(filter.is_protected("field_internal_notes"));
        assert!(filter.is_protected("uid"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = ProtectedFieldFilter::new(&ProtectedFieldRules {
            extra_fields: Vec::new(),
            extra_patterns: vec!["(".to_string()],
        })
        .unwrap_err();
        assert!(matches!(err, ProtectedFieldError::InvalidPattern { .. }));
    }

    #[test]
    fn report_lists_fields_and_patterns() {
        let report = ProtectedFieldFilter::builtin().unwrap().describe();
        assert_eq!(report.fields.len(), 15);
        assert_eq!(report.patterns, vec!["/^revision_/", "/^content_translation_/"]);
        assert_eq!(report.note, "These fields cannot be set via import for security reasons.");
    }
}
