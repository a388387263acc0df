// mcp-tools-cli/src/main.rs
// ============================================================================
// Module: MCP Tools CLI Entry Point
// Description: Command dispatcher for the MCP tools server and operator tasks.
// Purpose: Launch the server and inspect governance state from a terminal.
// Dependencies: clap, mcp-tools-config, mcp-tools-mcp, serde, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `mcp-tools` starts the MCP server and offers operator commands that run
//! through the same governed tool router as remote clients: the configured
//! scopes, access modes, and audit sink apply to every command here too.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use mcp_tools_cli::serve_policy::ALLOW_NON_LOOPBACK_ENV;
use mcp_tools_cli::serve_policy::BindOutcome;
use mcp_tools_cli::serve_policy::enforce_local_only;
use mcp_tools_cli::serve_policy::resolve_allow_non_loopback;
use mcp_tools_config::McpToolsConfig;
use mcp_tools_config::ServerTransport;
use mcp_tools_core::ToolResponse;
use mcp_tools_mcp::McpServer;
use mcp_tools_mcp::McpServerError;
use mcp_tools_mcp::ToolName;
use mcp_tools_mcp::ToolRouter;
use mcp_tools_mcp::build_router;
use mcp_tools_mcp::stdio_context;
use mcp_tools_mcp::tool_definitions;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "mcp-tools", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the MCP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Tool registry utilities.
    Tools {
        /// Selected tools subcommand.
        #[command(subcommand)]
        command: ToolsCommand,
    },
    /// Print access, rate-limit, and import status for this caller.
    Status(ConfigArgs),
    /// Clear rate-limit counters (requires the admin scope).
    ResetLimits(ResetLimitsCommand),
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config file and override selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Allow binding the HTTP transport to non-loopback addresses.
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Shared config file selection.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to mcp-tools.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file and report ignored names.
    Validate(ConfigArgs),
}

/// Tools subcommands.
#[derive(Subcommand, Debug)]
enum ToolsCommand {
    /// Print every tool definition as JSON.
    List,
}

/// Arguments for `reset-limits`.
#[derive(Args, Debug)]
struct ResetLimitsCommand {
    /// Config file and override selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Full client key to reset (defaults to this process).
    #[arg(long, value_name = "KEY")]
    client_key: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("mcp-tools {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Tools {
            command,
        } => command_tools(&command),
        Commands::Status(args) => command_status(&args),
        Commands::ResetLimits(command) => command_reset_limits(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let outcome = enforce_local_only(&config, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    warn_loopback_only_transport(&outcome, allow_non_loopback)?;
    if outcome.network_exposed {
        warn_network_exposure(&outcome)?;
    }

    let server = tokio::task::spawn_blocking(move || McpServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server
        .serve()
        .await
        .map_err(|err: McpServerError| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Notes that the HTTP transport is reachable from this host only.
fn warn_loopback_only_transport(outcome: &BindOutcome, allow_non_loopback: bool) -> CliResult<()> {
    if outcome.transport != ServerTransport::Http || allow_non_loopback {
        return Ok(());
    }
    let Some(addr) = outcome.bind_addr else {
        return Ok(());
    };
    write_stderr_line(&format!(
        "mcp-tools: serving on {addr} (loopback only; set {ALLOW_NON_LOOPBACK_ENV}=1 to expose)"
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Emits a governance banner when the server is network-exposed.
fn warn_network_exposure(outcome: &BindOutcome) -> CliResult<()> {
    let Some(addr) = outcome.bind_addr else {
        return Ok(());
    };
    let status = |enabled: bool| if enabled { "enabled" } else { "DISABLED" };
    let lines = [
        "mcp-tools: WARNING: server is reachable from the network".to_string(),
        format!("mcp-tools:   bind: {addr}"),
        format!("mcp-tools:   audit logging: {}", status(outcome.audit_enabled)),
        format!("mcp-tools:   write rate limits: {}", status(outcome.rate_limit_enabled)),
        format!(
            "mcp-tools:   header scopes: {}",
            if outcome.header_scopes_trusted { "TRUSTED" } else { "ignored" }
        ),
    ];
    for line in lines {
        write_stderr_line(&line).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => command_config_validate(&args),
    }
}

/// Executes the config validation command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    for warning in config.warnings() {
        write_stderr_line(&format!("warning: {warning}"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    write_stdout_line("config valid").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Tool Commands
// ============================================================================

/// Dispatches tools subcommands.
fn command_tools(command: &ToolsCommand) -> CliResult<ExitCode> {
    match command {
        ToolsCommand::List => {
            write_json(&tool_definitions())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Operator Commands
// ============================================================================

/// Combined status report printed by `status`.
#[derive(Debug, Serialize)]
struct StatusReport {
    /// `get_access_status` envelope.
    access: ToolResponse,
    /// `get_rate_limit_status` envelope.
    rate_limits: ToolResponse,
    /// `get_import_status` envelope.
    import: ToolResponse,
}

/// Executes the `status` command.
fn command_status(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let router = open_router(&config)?;
    let report = StatusReport {
        access: call_tool(&router, &config, ToolName::GetAccessStatus, json!({}))?,
        rate_limits: call_tool(&router, &config, ToolName::GetRateLimitStatus, json!({}))?,
        import: call_tool(&router, &config, ToolName::GetImportStatus, json!({}))?,
    };
    write_json(&report)?;
    let all_ok = report.access.success && report.rate_limits.success && report.import.success;
    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes the `reset-limits` command.
fn command_reset_limits(command: ResetLimitsCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let router = open_router(&config)?;
    let arguments = command
        .client_key
        .map_or_else(|| json!({}), |client_key| json!({"client_key": client_key}));
    let response = call_tool(&router, &config, ToolName::ResetRateLimits, arguments)?;
    write_json(&response)?;
    Ok(if response.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Builds the governed router for operator commands.
fn open_router(config: &McpToolsConfig) -> CliResult<ToolRouter> {
    build_router(config).map_err(|err| CliError::new(format!("router init failed: {err}")))
}

/// Calls a tool as the local stdio caller.
fn call_tool(
    router: &ToolRouter,
    config: &McpToolsConfig,
    tool: ToolName,
    arguments: Value,
) -> CliResult<ToolResponse> {
    router
        .handle_tool_call(&stdio_context(config), tool.as_str(), arguments)
        .map_err(|err| CliError::new(format!("{tool} failed: {err}")))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration from the selected path.
fn load_config(args: &ConfigArgs) -> CliResult<McpToolsConfig> {
    McpToolsConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Writes pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
