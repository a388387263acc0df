// mcp-tools-config/src/policy.rs
// ============================================================================
// Module: Policy Conversion
// Description: Converts validated configuration into governance policies.
// Purpose: Keep core components free of TOML concerns.
// Dependencies: mcp-tools-core
// ============================================================================

//! ## Overview
//! Each governance component takes an immutable policy value. These helpers
//! build those values from [`McpToolsConfig`]; unknown scope and kind names
//! are dropped here, matching how the components treat them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use mcp_tools_core::AccessPolicy;
use mcp_tools_core::Actor;
use mcp_tools_core::ProtectedFieldRules;
use mcp_tools_core::RateLimitPolicy;
use mcp_tools_core::ReadQuota;
use mcp_tools_core::Scope;
use mcp_tools_core::ScopePolicy;
use mcp_tools_core::ScopeSet;
use mcp_tools_core::WindowSize;
use mcp_tools_core::WriteKind;
use mcp_tools_core::runtime::rate_limit::BROKEN_LINK_SCAN;
use mcp_tools_core::runtime::rate_limit::CONTENT_SEARCH;

use crate::config::McpToolsConfig;

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl McpToolsConfig {
    /// Builds the scope resolution policy.
    #[must_use]
    pub fn scope_policy(&self) -> ScopePolicy {
        ScopePolicy {
            default_scopes: self.access.default_scopes.as_deref().map(known_scopes),
            allowed_scopes: self.access.allowed_scopes.as_deref().map(known_scopes),
            trust_header: self.access.trust_scopes_via_header,
            trust_query: self.access.trust_scopes_via_query,
            trust_env: self.access.trust_scopes_via_env,
        }
    }

    /// Builds the access policy.
    #[must_use]
    pub fn access_policy(&self) -> AccessPolicy {
        let kinds: BTreeSet<WriteKind> = self
            .access
            .config_only_allowed_write_kinds
            .iter()
            .filter_map(|name| WriteKind::parse(name))
            .collect();
        AccessPolicy {
            read_only_mode: self.access.read_only_mode,
            config_only_mode: self.access.config_only_mode,
            config_only_allowed_write_kinds: kinds,
        }
    }

    /// Builds the rate-limit policy, read quotas included.
    #[must_use]
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        let limits = &self.rate_limiting;
        let read_quotas = BTreeMap::from([
            (BROKEN_LINK_SCAN.to_string(), ReadQuota {
                max: self.rate_limits.broken_link_scan.max_per_hour,
                window: WindowSize::Hour,
            }),
            (CONTENT_SEARCH.to_string(), ReadQuota {
                max: self.rate_limits.content_search.max_per_minute,
                window: WindowSize::Minute,
            }),
        ]);
        RateLimitPolicy {
            enabled: limits.enabled,
            trust_client_id_header: limits.trust_client_id_header,
            max_writes_per_minute: limits.max_writes_per_minute,
            max_writes_per_hour: limits.max_writes_per_hour,
            max_deletes_per_hour: limits.max_deletes_per_hour,
            max_structure_changes_per_hour: limits.max_structure_changes_per_hour,
            read_quotas,
        }
    }

    /// Returns the protected field rules.
    #[must_use]
    pub fn protected_field_rules(&self) -> ProtectedFieldRules {
        self.protected_fields.rules()
    }

    /// Returns the actor recorded in audit entries.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::new(self.server.actor_id.trim(), self.server.actor_name.trim())
    }
}

/// Keeps only recognized scope names.
fn known_scopes(names: &[String]) -> ScopeSet {
    names.iter().filter_map(|name| Scope::parse(name)).collect()
}
