//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::control;
use serde_json::{Value, json};
use thiserror::Error;

use file_quarantine_helper::cli::signals::install_cancel_handler;
use file_quarantine_helper::cli::summary;
use file_quarantine_helper::core::config::Config;
use file_quarantine_helper::core::size::parse_size;
use file_quarantine_helper::logger::jsonl::{EventType, JsonlLogger, LogEntry, Severity};
use file_quarantine_helper::report::notify::{JsonFileSink, ReportSink};
use file_quarantine_helper::sweep::fsops::RealFs;
use file_quarantine_helper::sweep::run::{SweepConfig, SweepRunner};

/// File Quarantine Helper — scheduled hygiene for data directories.
#[derive(Debug, Parser)]
#[command(
    name = "fqh",
    author,
    version,
    about = "File Quarantine Helper - quarantine, truncate, expire",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Execute one maintenance pass (truncate, quarantine, expire).
    Run(RunArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct RunArgs {
    /// Compute and report decisions without touching any file.
    #[arg(long)]
    dry_run: bool,
    /// Enable the log truncation phase for this run.
    #[arg(long)]
    truncate_logs: bool,
    /// Truncation threshold (e.g. "5MB"); implies --truncate-logs.
    #[arg(long, value_name = "SIZE")]
    truncate_size: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_pass(cli, args),
        Command::Config(args) => run_config(cli, args),
    }
}

fn run_pass(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;

    // Flags layer on top of file + env config.
    if args.dry_run {
        config.sweep.dry_run = true;
    }
    if args.truncate_logs || args.truncate_size.is_some() {
        config.truncation.enabled = true;
    }
    if let Some(raw) = &args.truncate_size {
        parse_size(raw).map_err(|e| CliError::User(e.to_string()))?;
        config.truncation.max_size = raw.clone();
    }

    let sweep_config =
        SweepConfig::from_config(&config).map_err(|e| CliError::User(e.to_string()))?;
    let logger = JsonlLogger::new(&config.report.jsonl_log);

    let runner = SweepRunner::new(sweep_config, logger.clone());
    install_cancel_handler(&runner.cancel_flag())
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let report = runner
        .run(&RealFs)
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    // Report delivery is best-effort: a failed write is logged, the pass
    // still counts as completed.
    if !config.report.output_file.as_os_str().is_empty() {
        let sink = JsonFileSink::new(config.report.output_file.clone());
        match sink.deliver(&report) {
            Ok(()) => logger.log(
                &LogEntry::new(EventType::ReportDelivered, Severity::Info)
                    .with_path(&config.report.output_file),
            ),
            Err(err) => logger.log(
                &LogEntry::new(EventType::ReportDeliveryFailed, Severity::Warning)
                    .with_path(&config.report.output_file)
                    .with_error_code(err.code())
                    .with_details(err.to_string()),
            ),
        }
    }

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                print!("{}", summary::render(&report));
            }
        }
        OutputMode::Json => {
            let payload = serde_json::to_value(&report)?;
            write_json_line(&payload)?;
        }
    }

    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command.as_ref().unwrap_or(&ConfigCommand::Show) {
        ConfigCommand::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            match output_mode(cli) {
                OutputMode::Human => println!("{}", path.display()),
                OutputMode::Json => write_json_line(&json!({
                    "command": "config path",
                    "path": path.to_string_lossy(),
                }))?,
            }
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Human => {
                    let rendered = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(e.to_string()))?;
                    print!("{rendered}");
                }
                OutputMode::Json => {
                    let payload = serde_json::to_value(&config)?;
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let result = Config::load(cli.config.as_deref());
            match output_mode(cli) {
                OutputMode::Human => match &result {
                    Ok(_) => println!("Configuration is valid."),
                    Err(e) => eprintln!("Configuration invalid: {e}"),
                },
                OutputMode::Json => {
                    let payload = match &result {
                        Ok(_) => json!({"command": "config validate", "valid": true}),
                        Err(e) => json!({
                            "command": "config validate",
                            "valid": false,
                            "error_code": e.code(),
                            "error": e.to_string(),
                        }),
                    };
                    write_json_line(&payload)?;
                }
            }
            result.map(|_| ()).map_err(|e| CliError::User(e.to_string()))
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(|e| CliError::User(e.to_string()))
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("FQH_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        Some("auto") | None => fallback,
        Some(_) => fallback,
    }
}
