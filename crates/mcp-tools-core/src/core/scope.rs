// mcp-tools-core/src/core/scope.rs
// ============================================================================
// Module: Scope Resolution
// Description: Permission scopes and per-request scope resolution.
// Purpose: Compute the effective scope set under a configured ceiling.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every MCP request carries a set of coarse permission scopes. The resolver
//! combines configured defaults with trusted override sources (header, query,
//! environment) and clamps the result to the `allowed_scopes` ceiling.
//!
//! ## Invariants
//! - The resolved set is always a subset of the ceiling.
//! - The resolved set is never empty.
//! - Override sources are consulted in header, query, environment order and
//!   never merged: the first enabled source that is present and yields a
//!   non-empty intersection wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::context::RequestContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying requested scopes (lowercase, HTTP transport).
pub const SCOPE_HEADER: &str = "x-mcp-scope";
/// Query parameter carrying requested scopes.
pub const SCOPE_QUERY_PARAM: &str = "mcp_scope";
/// Environment variable carrying requested scopes (stdio transport).
pub const SCOPE_ENV_VAR: &str = "MCP_SCOPE";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Coarse permission grant attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Read-only access.
    Read,
    /// Content and configuration writes.
    Write,
    /// Administrative operations.
    Admin,
}

impl Scope {
    /// Returns the canonical string name for the scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }

    /// Returns all scopes in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Read, Self::Write, Self::Admin]
    }

    /// Parses a scope name, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Ordered set of scopes.
pub type ScopeSet = BTreeSet<Scope>;

/// Where the resolved scopes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSource {
    /// Trusted `X-MCP-Scope` header.
    Header,
    /// Trusted `mcp_scope` query parameter.
    Query,
    /// Trusted `MCP_SCOPE` environment variable.
    Environment,
    /// Configured default scopes.
    Default,
}

/// Scope configuration consumed by [`ScopeResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePolicy {
    /// Scopes used when no trusted override applies (`None` when unset).
    pub default_scopes: Option<ScopeSet>,
    /// Hard ceiling for every request (`None` when unset).
    pub allowed_scopes: Option<ScopeSet>,
    /// Trust the `X-MCP-Scope` header.
    pub trust_header: bool,
    /// Trust the `mcp_scope` query parameter.
    pub trust_query: bool,
    /// Trust the `MCP_SCOPE` environment variable.
    pub trust_env: bool,
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self {
            default_scopes: Some(BTreeSet::from([Scope::Read])),
            allowed_scopes: None,
            trust_header: false,
            trust_query: false,
            trust_env: false,
        }
    }
}

/// Scope set produced for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedScopes {
    /// Effective scopes.
    pub scopes: ScopeSet,
    /// Source that produced the scopes.
    pub source: ScopeSource,
}

impl ResolvedScopes {
    /// Returns true when the set contains the scope.
    #[must_use]
    pub fn contains(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    /// Returns the scopes as a comma-separated list.
    #[must_use]
    pub fn joined(&self) -> String {
        join_scopes(&self.scopes)
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves effective scopes for requests.
///
/// # Invariants
/// - `defaults` is a non-empty subset of `ceiling`.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    /// Normalized ceiling.
    ceiling: ScopeSet,
    /// Normalized defaults.
    defaults: ScopeSet,
    /// Header override enabled.
    trust_header: bool,
    /// Query override enabled.
    trust_query: bool,
    /// Environment override enabled.
    trust_env: bool,
}

impl ScopeResolver {
    /// Builds a resolver from policy, normalizing the ceiling and defaults.
    #[must_use]
    pub fn new(policy: &ScopePolicy) -> Self {
        let mut ceiling = policy
            .allowed_scopes
            .clone()
            .or_else(|| policy.default_scopes.clone())
            .unwrap_or_else(|| BTreeSet::from([Scope::Read]));
        if ceiling.is_empty() {
            ceiling.insert(Scope::Read);
        }
        let requested_defaults =
            policy.default_scopes.clone().unwrap_or_else(|| BTreeSet::from([Scope::Read]));
        let mut defaults: ScopeSet = requested_defaults.intersection(&ceiling).copied().collect();
        if defaults.is_empty() {
            defaults.clone_from(&ceiling);
        }
        Self {
            ceiling,
            defaults,
            trust_header: policy.trust_header,
            trust_query: policy.trust_query,
            trust_env: policy.trust_env,
        }
    }

    /// Returns the normalized scope ceiling.
    #[must_use]
    pub const fn ceiling(&self) -> &ScopeSet {
        &self.ceiling
    }

    /// Resolves the effective scopes for a request.
    #[must_use]
    pub fn resolve(&self, context: &RequestContext) -> ResolvedScopes {
        if self.trust_header
            && let Some(raw) = context.header(SCOPE_HEADER)
            && let Some(scopes) = self.clamp(raw)
        {
            return ResolvedScopes {
                scopes,
                source: ScopeSource::Header,
            };
        }
        if self.trust_query
            && let Some(raw) = context.query_param(SCOPE_QUERY_PARAM)
            && let Some(scopes) = self.clamp(raw)
        {
            return ResolvedScopes {
                scopes,
                source: ScopeSource::Query,
            };
        }
        if self.trust_env
            && let Some(raw) = context.env_scope.as_deref()
            && !raw.is_empty()
            && let Some(scopes) = self.clamp(raw)
        {
            return ResolvedScopes {
                scopes,
                source: ScopeSource::Environment,
            };
        }
        ResolvedScopes {
            scopes: self.defaults.clone(),
            source: ScopeSource::Default,
        }
    }

    /// Intersects a raw scope list with the ceiling; `None` when empty.
    fn clamp(&self, raw: &str) -> Option<ScopeSet> {
        let scopes: ScopeSet =
            parse_scope_list(raw).intersection(&self.ceiling).copied().collect();
        if scopes.is_empty() { None } else { Some(scopes) }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a comma-separated scope list, dropping unknown entries.
#[must_use]
pub fn parse_scope_list(raw: &str) -> ScopeSet {
    raw.split(',').filter_map(Scope::parse).collect()
}

/// Joins scopes into a comma-separated list in canonical order.
#[must_use]
pub fn join_scopes(scopes: &ScopeSet) -> String {
    scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(",")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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
        reason = "Test-only assertions."
    )]

    use std::collections::BTreeSet;

    use super::Scope;
    use super::ScopePolicy;
    use super::ScopeResolver;
    use super::ScopeSource;
    use super::parse_scope_list;
    use crate::core::context::RequestContext;

    fn set(scopes: &[Scope]) -> BTreeSet<Scope> {
        scopes.iter().copied().collect()
    }

    #[test]
    fn parse_scope_list_trims_and_drops_unknown() {
        let parsed = parse_scope_list(" read , superuser,admin,");
        assert_eq!(parsed, set(&[Scope::Read, Scope::Admin]));
    }

    #[test]
    fn header_is_clamped_to_ceiling() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            default_scopes: Some(set(&[Scope::Read])),
            allowed_scopes: Some(set(&[Scope::Read])),
            trust_header: true,
            ..ScopePolicy::default()
        });
        let context =
            RequestContext::http(None).with_header("X-MCP-Scope", "read,write,admin");
        let resolved = resolver.resolve(&context);
        assert_eq!(resolved.scopes, set(&[Scope::Read]));
        assert_eq!(resolved.source, ScopeSource::Header);
    }

    #[test]
    fn untrusted_header_is_ignored() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            allowed_scopes: Some(set(&[Scope::Read, Scope::Write])),
            ..ScopePolicy::default()
        });
        let context = RequestContext::http(None).with_header("x-mcp-scope", "write");
        let resolved = resolver.resolve(&context);
        assert_eq!(resolved.scopes, set(&[Scope::Read]));
        assert_eq!(resolved.source, ScopeSource::Default);
    }

    #[test]
    fn absent_header_falls_through_to_query() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            allowed_scopes: Some(set(&[Scope::Read, Scope::Write])),
            trust_header: true,
            trust_query: true,
            ..ScopePolicy::default()
        });
        let context = RequestContext::http(None).with_query("mcp_scope", "write");
        let resolved = resolver.resolve(&context);
        assert_eq!(resolved.scopes, set(&[Scope::Write]));
        assert_eq!(resolved.source, ScopeSource::Query);
    }

    #[test]
    fn header_wins_over_query_without_merging() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            allowed_scopes: Some(set(&[Scope::Read, Scope::Write, Scope::Admin])),
            trust_header: true,
            trust_query: true,
            ..ScopePolicy::default()
        });
        let context = RequestContext::http(None)
            .with_header("x-mcp-scope", "admin")
            .with_query("mcp_scope", "write");
        let resolved = resolver.resolve(&context);
        assert_eq!(resolved.scopes, set(&[Scope::Admin]));
    }

    #[test]
    fn header_outside_ceiling_falls_through() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            allowed_scopes: Some(set(&[Scope::Read, Scope::Write])),
            trust_header: true,
            trust_env: true,
            ..ScopePolicy::default()
        });
        let context = RequestContext::stdio()
            .with_header("x-mcp-scope", "admin")
            .with_env_scope("write");
        let resolved = resolver.resolve(&context);
        assert_eq!(resolved.scopes, set(&[Scope::Write]));
        assert_eq!(resolved.source, ScopeSource::Environment);
    }

    #[test]
    fn empty_env_value_is_absent() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            allowed_scopes: Some(set(&[Scope::Read, Scope::Write])),
            trust_env: true,
            ..ScopePolicy::default()
        });
        let resolved = resolver.resolve(&RequestContext::stdio().with_env_scope(""));
        assert_eq!(resolved.source, ScopeSource::Default);
    }

    #[test]
    fn defaults_outside_ceiling_fall_back_to_ceiling() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            default_scopes: Some(set(&[Scope::Admin])),
            allowed_scopes: Some(set(&[Scope::Read, Scope::Write])),
            ..ScopePolicy::default()
        });
        let resolved = resolver.resolve(&RequestContext::stdio());
        assert_eq!(resolved.scopes, set(&[Scope::Read, Scope::Write]));
    }

    #[test]
    fn empty_ceiling_falls_back_to_read() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            default_scopes: Some(BTreeSet::new()),
            allowed_scopes: Some(BTreeSet::new()),
            ..ScopePolicy::default()
        });
        assert_eq!(resolver.ceiling(), &set(&[Scope::Read]));
        assert_eq!(resolver.resolve(&RequestContext::stdio()).scopes, set(&[Scope::Read]));
    }

    #[test]
    fn unset_ceiling_uses_defaults() {
        let resolver = ScopeResolver::new(&ScopePolicy {
            default_scopes: Some(set(&[Scope::Read, Scope::Write])),
            allowed_scopes: None,
            trust_header: true,
            ..ScopePolicy::default()
        });
        let context = RequestContext::http(None).with_header("x-mcp-scope", "admin,write");
        assert_eq!(resolver.resolve(&context).scopes, set(&[Scope::Write]));
    }
}
