// mcp-tools-core/src/core/access.rs
// ============================================================================
// Module: Access Decisions
// Description: Read-only, config-only, and scope checks for tool calls.
// Purpose: Produce deterministic allow/deny decisions before any side effect.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`AccessManager`] evaluates a fixed rule chain for each operation:
//! read-only mode, then config-only mode, then scope membership. It holds only
//! immutable configuration, so identical inputs always yield identical
//! decisions and evaluation never touches rate-limit or audit state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::envelope::ErrorCode;
use crate::core::scope::Scope;
use crate::core::scope::ScopeSet;
use crate::core::scope::join_scopes;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Operation class of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read-only call.
    Read,
    /// Mutating call.
    Write,
    /// Administrative call.
    Admin,
}

impl Operation {
    /// Returns the scope required to perform the operation.
    #[must_use]
    pub const fn required_scope(self) -> Scope {
        match self {
            Self::Read => Scope::Read,
            Self::Write => Scope::Write,
            Self::Admin => Scope::Admin,
        }
    }

    /// Returns the capitalized label used in denial messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Admin => "Admin",
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Resource kind targeted by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    /// Content entities (nodes, users, media, menus).
    Content,
    /// Site configuration.
    Config,
    /// Operational tasks (cache, cron, indexing).
    Ops,
}

impl WriteKind {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Config => "config",
            Self::Ops => "ops",
        }
    }

    /// Parses a write kind, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "content" => Some(Self::Content),
            "config" => Some(Self::Config),
            "ops" => Some(Self::Ops),
            _ => None,
        }
    }

    /// Derives the write kind from a tool category.
    #[must_use]
    pub fn from_category(category: &str) -> Self {
        match category.trim().to_ascii_lowercase().as_str() {
            "content" | "users" | "media" | "batch" | "migration" | "moderation" | "scheduler"
            | "redirect" | "entity_clone" | "menus" => Self::Content,
            "cache" | "cron" | "ultimate_cron" | "search_api" => Self::Ops,
            _ => Self::Config,
        }
    }
}

impl fmt::Display for WriteKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Access configuration consumed by [`AccessManager`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessPolicy {
    /// Deny every non-read operation.
    pub read_only_mode: bool,
    /// Restrict writes to the allowed write kinds.
    pub config_only_mode: bool,
    /// Write kinds permitted in config-only mode.
    pub config_only_allowed_write_kinds: BTreeSet<WriteKind>,
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether the call may proceed.
    pub allowed: bool,
    /// Denial message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Denial code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl AccessDecision {
    /// Builds an allow decision.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            code: None,
        }
    }

    /// Builds a deny decision.
    #[must_use]
    pub fn deny(code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            code: Some(code),
        }
    }
}

/// Access status report for introspection tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessStatus {
    /// Read-only mode flag.
    pub read_only_mode: bool,
    /// Config-only mode flag.
    pub config_only_mode: bool,
    /// Effective write kinds permitted in config-only mode.
    pub config_only_allowed_write_kinds: Vec<WriteKind>,
    /// Scopes of the current connection.
    pub scopes: Vec<Scope>,
    /// Read operations permitted.
    pub can_read: bool,
    /// Write operations permitted.
    pub can_write: bool,
    /// Admin operations permitted.
    pub can_admin: bool,
}

// ============================================================================
// SECTION: Access Manager
// ============================================================================

/// Evaluates access rules for tool calls.
#[derive(Debug, Clone)]
pub struct AccessManager {
    /// Deny every non-read operation.
    read_only_mode: bool,
    /// Restrict writes to `allowed_kinds`.
    config_only_mode: bool,
    /// Normalized write kinds permitted in config-only mode (never empty).
    allowed_kinds: BTreeSet<WriteKind>,
}

impl AccessManager {
    /// Builds an access manager, defaulting an empty allow list to `{config}`.
    #[must_use]
    pub fn new(policy: &AccessPolicy) -> Self {
        let mut allowed_kinds = policy.config_only_allowed_write_kinds.clone();
        if allowed_kinds.is_empty() {
            allowed_kinds.insert(WriteKind::Config);
        }
        Self {
            read_only_mode: policy.read_only_mode,
            config_only_mode: policy.config_only_mode,
            allowed_kinds,
        }
    }

    /// Returns true when read-only mode is active.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only_mode
    }

    /// Returns true when config-only mode is active.
    #[must_use]
    pub const fn is_config_only(&self) -> bool {
        self.config_only_mode
    }

    /// Returns true when a write of `kind` passes config-only mode.
    #[must_use]
    pub fn is_write_kind_allowed(&self, kind: WriteKind) -> bool {
        !self.config_only_mode || self.allowed_kinds.contains(&kind)
    }

    /// Checks whether an operation is permitted for a scope set.
    ///
    /// `kind` defaults to [`WriteKind::Config`] for writes when absent.
    #[must_use]
    pub fn check_access(
        &self,
        scopes: &ScopeSet,
        operation: Operation,
        kind: Option<WriteKind>,
    ) -> AccessDecision {
        if self.read_only_mode && operation != Operation::Read {
            return AccessDecision::deny(
                ErrorCode::ReadOnlyMode,
                format!(
                    "{} operations are disabled. Site is in read-only mode.",
                    operation.label()
                ),
            );
        }
        if operation == Operation::Write {
            let kind = kind.unwrap_or(WriteKind::Config);
            if !self.is_write_kind_allowed(kind) {
                return AccessDecision::deny(
                    ErrorCode::ConfigOnlyMode,
                    format!(
                        "Write operations for '{kind}' are disabled. Site is in config-only mode \
                         (allowed: {}).",
                        self.allowed_kinds_joined()
                    ),
                );
            }
        }
        if !scopes.contains(&operation.required_scope()) {
            return AccessDecision::deny(
                ErrorCode::InsufficientScope,
                format!(
                    "{} operations not allowed for this connection. Scope: {}",
                    operation.label(),
                    join_scopes(scopes)
                ),
            );
        }
        AccessDecision::allow()
    }

    /// Reports the access configuration as seen by a scope set.
    #[must_use]
    pub fn status(&self, scopes: &ScopeSet) -> AccessStatus {
        AccessStatus {
            read_only_mode: self.read_only_mode,
            config_only_mode: self.config_only_mode,
            config_only_allowed_write_kinds: self.allowed_kinds.iter().copied().collect(),
            scopes: scopes.iter().copied().collect(),
            can_read: scopes.contains(&Scope::Read),
            can_write: scopes.contains(&Scope::Write) && !self.read_only_mode,
            can_admin: scopes.contains(&Scope::Admin) && !self.read_only_mode,
        }
    }

    /// Joins the allowed write kinds for messages.
    fn allowed_kinds_joined(&self) -> String {
        self.allowed_kinds.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(", ")
    }
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

    use std::collections::BTreeSet;

    use super::AccessManager;
    use super::AccessPolicy;
    use super::Operation;
    use super::WriteKind;
    use crate::core::envelope::ErrorCode;
    use crate::core::scope::Scope;

    fn scopes(list: &[Scope]) -> BTreeSet<Scope> {
        list.iter().copied().collect()
    }

    #[test]
    fn read_only_mode_blocks_writes_and_admin() {
        let manager = AccessManager::new(&AccessPolicy {
            read_only_mode: true,
            ..AccessPolicy::default()
        });
        let all = scopes(Scope::all());
        let write = manager.check_access(&all, Operation::Write, Some(WriteKind::Content));
        assert_eq!(write.code, Some(ErrorCode::ReadOnlyMode));
        assert_eq!(
            write.reason.as_deref(),
            Some("Write operations are disabled. Site is in read-only mode.")
        );
        let admin = manager.check_access(&all, Operation::Admin, None);
        assert_eq!(
            admin.reason.as_deref(),
            Some("Admin operations are disabled. Site is in read-only mode.")
        );
        assert!(manager.check_access(&all, Operation::Read, None).allowed);
    }

    #[test]
    fn config_only_mode_blocks_content_writes() {
        let manager = AccessManager::new(&AccessPolicy {
            config_only_mode: true,
            ..AccessPolicy::default()
        });
        let write_scopes = scopes(&[Scope::Read, Scope::Write]);
        let content = manager.check_access(&write_scopes, Operation::Write, Some(WriteKind::Content));
        assert_eq!(content.code, Some(ErrorCode::ConfigOnlyMode));
        let config = manager.check_access(&write_scopes, Operation::Write, Some(WriteKind::Config));
        assert!(config.allowed);
        let unspecified = manager.check_access(&write_scopes, Operation::Write, None);
        assert!(unspecified.allowed);
    }

    #[test]
    fn config_only_mode_still_requires_scope() {
        let manager = AccessManager::new(&AccessPolicy {
            config_only_mode: true,
            ..AccessPolicy::default()
        });
        let decision =
            manager.check_access(&scopes(&[Scope::Read]), Operation::Write, Some(WriteKind::Config));
        assert_eq!(decision.code, Some(ErrorCode::InsufficientScope));
    }

    #[test]
    fn missing_scope_reports_connection_scope() {
        let manager = AccessManager::new(&AccessPolicy::default());
        let decision = manager.check_access(&scopes(&[Scope::Read]), Operation::Admin, None);
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("Admin operations not allowed for this connection. Scope: read")
        );
    }

    #[test]
    fn decisions_are_repeatable() {
        let manager = AccessManager::new(&AccessPolicy::default());
        let set = scopes(&[Scope::Read, Scope::Write]);
        let first = manager.check_access(&set, Operation::Write, Some(WriteKind::Content));
        let second = manager.check_access(&set, Operation::Write, Some(WriteKind::Content));
        assert_eq!(first, second);
    }

    #[test]
    fn categories_map_to_write_kinds() {
        assert_eq!(WriteKind::from_category("migration"), WriteKind::Content);
        assert_eq!(WriteKind::from_category("ultimate_cron"), WriteKind::Ops);
        assert_eq!(WriteKind::from_category("views"), WriteKind::Config);
    }

    #[test]
    fn status_reflects_scopes_and_modes() {
        let manager = AccessManager::new(&AccessPolicy {
            read_only_mode: true,
            ..AccessPolicy::default()
        });
        let status = manager.status(&scopes(&[Scope::Read, Scope::Write]));
        assert!(status.can_read);
        assert!(!status.can_write);
        assert_eq!(status.config_only_allowed_write_kinds, vec![WriteKind::Config]);
    }
}
