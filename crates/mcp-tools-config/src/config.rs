// mcp-tools-config/src/config.rs
// ============================================================================
// Module: MCP Tools Configuration
// Description: Configuration loading and validation for MCP tools.
// Purpose: Provide strict config parsing with hard limits.
// Dependencies: mcp-tools-core, mcp-tools-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file is a valid configuration.
//! Unknown scope and write-kind names are tolerated (the governance layer
//! ignores them) and surfaced through [`McpToolsConfig::warnings`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use mcp_tools_core::ProtectedFieldFilter;
use mcp_tools_core::ProtectedFieldRules;
use mcp_tools_core::Scope;
use mcp_tools_core::WriteKind;
use mcp_tools_store_sqlite::SqliteStoreMode;
use mcp_tools_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "mcp-tools.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "MCP_TOOLS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum allowed value for any rate limit.
pub(crate) const MAX_RATE_LIMIT: u64 = 100_000;
/// Maximum allowed request body size in bytes.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Default request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default `SQLite` busy timeout.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout.
const MAX_STORE_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Maximum length of actor identity strings.
const MAX_ACTOR_FIELD_LENGTH: usize = 128;
/// Maximum number of extra protected fields or patterns.
const MAX_PROTECTED_EXTRAS: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// MCP tools configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpToolsConfig {
    /// Access control configuration.
    #[serde(default)]
    pub access: AccessConfig,
    /// Write-class rate limiting.
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
    /// Named read quotas.
    #[serde(default)]
    pub rate_limits: ReadQuotasConfig,
    /// Server transport configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Rate-limit and import status persistence.
    #[serde(default)]
    pub state_store: StateStoreConfig,
    /// Content store seeding.
    #[serde(default)]
    pub content: ContentConfig,
    /// Site-specific protected field additions.
    #[serde(default)]
    pub protected_fields: ProtectedFieldsConfig,
}

impl McpToolsConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limiting.validate()?;
        self.rate_limits.validate()?;
        self.server.validate()?;
        self.audit.validate()?;
        self.state_store.validate()?;
        self.content.validate()?;
        self.protected_fields.validate()?;
        Ok(())
    }

    /// Returns non-fatal findings: names the governance layer will ignore.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let scope_lists = [
            ("access.default_scopes", self.access.default_scopes.as_ref()),
            ("access.allowed_scopes", self.access.allowed_scopes.as_ref()),
        ];
        for (field, names) in scope_lists {
            for name in names.into_iter().flatten() {
                if Scope::parse(name).is_none() {
                    warnings.push(format!("{field}: unknown scope '{name}' is ignored"));
                }
            }
        }
        for name in &self.access.config_only_allowed_write_kinds {
            if WriteKind::parse(name).is_none() {
                warnings.push(format!(
                    "access.config_only_allowed_write_kinds: unknown kind '{name}' is ignored"
                ));
            }
        }
        warnings
    }
}

/// Access control configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Deny every non-read operation.
    #[serde(default)]
    pub read_only_mode: bool,
    /// Restrict writes to the allowed kinds.
    #[serde(default)]
    pub config_only_mode: bool,
    /// Write kinds permitted in config-only mode.
    #[serde(default = "default_config_only_kinds")]
    pub config_only_allowed_write_kinds: Vec<String>,
    /// Scopes granted when no override applies.
    #[serde(default)]
    pub default_scopes: Option<Vec<String>>,
    /// Scope ceiling.
    #[serde(default)]
    pub allowed_scopes: Option<Vec<String>>,
    /// Honor the `X-MCP-Scope` header.
    #[serde(default)]
    pub trust_scopes_via_header: bool,
    /// Honor the `mcp_scope` query parameter.
    #[serde(default)]
    pub trust_scopes_via_query: bool,
    /// Honor the `MCP_SCOPE` environment variable.
    #[serde(default)]
    pub trust_scopes_via_env: bool,
    /// Emit audit records.
    #[serde(default = "default_true")]
    pub audit_logging: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            read_only_mode: false,
            config_only_mode: false,
            config_only_allowed_write_kinds: default_config_only_kinds(),
            default_scopes: None,
            allowed_scopes: None,
            trust_scopes_via_header: false,
            trust_scopes_via_query: false,
            trust_scopes_via_env: false,
            audit_logging: true,
        }
    }
}

/// Write-class rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingConfig {
    /// Enables write-class limits.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Partition buckets by the `X-MCP-Client-Id` header.
    #[serde(default)]
    pub trust_client_id_header: bool,
    /// Writes per minute.
    #[serde(default = "default_max_writes_per_minute")]
    pub max_writes_per_minute: u64,
    /// Writes per hour.
    #[serde(default = "default_max_writes_per_hour")]
    pub max_writes_per_hour: u64,
    /// Deletes per hour.
    #[serde(default = "default_max_deletes_per_hour")]
    pub max_deletes_per_hour: u64,
    /// Structure changes per hour.
    #[serde(default = "default_max_structure_changes_per_hour")]
    pub max_structure_changes_per_hour: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trust_client_id_header: false,
            max_writes_per_minute: default_max_writes_per_minute(),
            max_writes_per_hour: default_max_writes_per_hour(),
            max_deletes_per_hour: default_max_deletes_per_hour(),
            max_structure_changes_per_hour: default_max_structure_changes_per_hour(),
        }
    }
}

impl RateLimitingConfig {
    /// Validates rate limit bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_writes_per_minute", self.max_writes_per_minute),
            ("max_writes_per_hour", self.max_writes_per_hour),
            ("max_deletes_per_hour", self.max_deletes_per_hour),
            ("max_structure_changes_per_hour", self.max_structure_changes_per_hour),
        ];
        for (field, value) in limits {
            if value == 0 || value > MAX_RATE_LIMIT {
                return Err(ConfigError::Invalid(format!(
                    "rate_limiting.{field} must be between 1 and {MAX_RATE_LIMIT}"
                )));
            }
        }
        Ok(())
    }
}

/// Named read quota configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadQuotasConfig {
    /// Broken link scan quota.
    #[serde(default)]
    pub broken_link_scan: BrokenLinkScanQuota,
    /// Content search quota.
    #[serde(default)]
    pub content_search: ContentSearchQuota,
}

impl ReadQuotasConfig {
    /// Validates quota upper bounds; non-positive values mean unlimited.
    fn validate(&self) -> Result<(), ConfigError> {
        let quotas = [
            ("broken_link_scan.max_per_hour", self.broken_link_scan.max_per_hour),
            ("content_search.max_per_minute", self.content_search.max_per_minute),
        ];
        for (field, value) in quotas {
            if value > 0 && value.unsigned_abs() > MAX_RATE_LIMIT {
                return Err(ConfigError::Invalid(format!(
                    "rate_limits.{field} must not exceed {MAX_RATE_LIMIT}"
                )));
            }
        }
        Ok(())
    }
}

/// Broken link scan quota.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BrokenLinkScanQuota {
    /// Scans per hour; non-positive is unlimited.
    #[serde(default = "default_broken_link_scans_per_hour")]
    pub max_per_hour: i64,
}

impl Default for BrokenLinkScanQuota {
    fn default() -> Self {
        Self {
            max_per_hour: default_broken_link_scans_per_hour(),
        }
    }
}

/// Content search quota.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ContentSearchQuota {
    /// Searches per minute; non-positive is unlimited.
    #[serde(default = "default_content_searches_per_minute")]
    pub max_per_minute: i64,
}

impl Default for ContentSearchQuota {
    fn default() -> Self {
        Self {
            max_per_minute: default_content_searches_per_minute(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Transport type for MCP.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the HTTP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Actor identifier recorded in audit entries.
    #[serde(default = "default_actor_id")]
    pub actor_id: String,
    /// Actor display name recorded in audit entries.
    #[serde(default = "default_actor_name")]
    pub actor_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            max_body_bytes: default_max_body_bytes(),
            actor_id: default_actor_id(),
            actor_name: default_actor_name(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must not exceed {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        for (field, value) in [("actor_id", &self.actor_id), ("actor_name", &self.actor_name)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("server.{field} must be non-empty")));
            }
            if value.len() > MAX_ACTOR_FIELD_LENGTH {
                return Err(ConfigError::Invalid(format!("server.{field} exceeds max length")));
            }
        }
        match self.transport {
            ServerTransport::Http => {
                let bind = self.bind.as_deref().unwrap_or_default().trim();
                if bind.is_empty() {
                    return Err(ConfigError::Invalid(
                        "http transport requires bind address".to_string(),
                    ));
                }
                bind.parse::<SocketAddr>()
                    .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))?;
            }
            ServerTransport::Stdio => {}
        }
        Ok(())
    }
}

/// Supported MCP transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Use stdin/stdout transport.
    #[default]
    Stdio,
    /// Use HTTP JSON-RPC transport.
    Http,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: AuditSinkType,
    /// JSON lines path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit sink configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.sink {
            AuditSinkType::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("file audit sink requires path".to_string())
                })?;
                validate_path_string("audit.path", path)
            }
            AuditSinkType::Stderr | AuditSinkType::None => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "audit.path is only valid with the file sink".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Audit sink backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Append-only JSON lines file.
    File,
    /// Discard records.
    None,
}

/// State store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StateStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StateStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            store_type: StateStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StateStoreConfig {
    /// Validates state store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StateStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory state_store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StateStoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite state_store requires path".to_string())
                })?;
                validate_path_string("state_store.path", &path.to_string_lossy())?;
                if self.busy_timeout_ms > MAX_STORE_BUSY_TIMEOUT_MS {
                    return Err(ConfigError::Invalid(format!(
                        "state_store.busy_timeout_ms must not exceed {MAX_STORE_BUSY_TIMEOUT_MS}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// State store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StateStoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use `SQLite`-backed durable store.
    Sqlite,
}

/// Content store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentConfig {
    /// Optional JSON seed of content types and records.
    #[serde(default)]
    pub seed_path: Option<String>,
}

impl ContentConfig {
    /// Validates content configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.seed_path {
            validate_path_string("content.seed_path", path)?;
        }
        Ok(())
    }
}

/// Site-specific additions to the protected field blocklist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtectedFieldsConfig {
    /// Extra exact field names.
    #[serde(default)]
    pub extra_fields: Vec<String>,
    /// Extra regex patterns.
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

impl ProtectedFieldsConfig {
    /// Validates extras and compiles patterns.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.extra_fields.len() > MAX_PROTECTED_EXTRAS
            || self.extra_patterns.len() > MAX_PROTECTED_EXTRAS
        {
            return Err(ConfigError::Invalid(format!(
                "protected_fields entries must not exceed {MAX_PROTECTED_EXTRAS}"
            )));
        }
        if self.extra_fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "protected_fields.extra_fields entries must be non-empty".to_string(),
            ));
        }
        ProtectedFieldFilter::new(&self.rules())
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }

    /// Returns the protected field rules.
    #[must_use]
    pub fn rules(&self) -> ProtectedFieldRules {
        ProtectedFieldRules {
            extra_fields: self.extra_fields.clone(),
            extra_patterns: self.extra_patterns.clone(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI input or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Returns true for boolean defaults that are enabled.
const fn default_true() -> bool {
    true
}

/// Default write kinds permitted in config-only mode.
fn default_config_only_kinds() -> Vec<String> {
    vec![WriteKind::Config.as_str().to_string()]
}

/// Default writes per minute.
const fn default_max_writes_per_minute() -> u64 {
    mcp_tools_core::runtime::rate_limit::DEFAULT_MAX_WRITES_PER_MINUTE
}

/// Default writes per hour.
const fn default_max_writes_per_hour() -> u64 {
    mcp_tools_core::runtime::rate_limit::DEFAULT_MAX_WRITES_PER_HOUR
}

/// Default deletes per hour.
const fn default_max_deletes_per_hour() -> u64 {
    mcp_tools_core::runtime::rate_limit::DEFAULT_MAX_DELETES_PER_HOUR
}

/// Default structure changes per hour.
const fn default_max_structure_changes_per_hour() -> u64 {
    mcp_tools_core::runtime::rate_limit::DEFAULT_MAX_STRUCTURE_CHANGES_PER_HOUR
}

/// Default broken link scans per hour.
const fn default_broken_link_scans_per_hour() -> i64 {
    10
}

/// Default content searches per minute.
const fn default_content_searches_per_minute() -> i64 {
    30
}

/// Default request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default store busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default audit actor identifier.
fn default_actor_id() -> String {
    "0".to_string()
}

/// Default audit actor name.
fn default_actor_name() -> String {
    "anonymous".to_string()
}
