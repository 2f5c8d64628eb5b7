mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::EvalOptions;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use url::Url;

#[derive(Parser)]
#[command(name = "evalgate")]
#[command(about = "Run code snippets from chat messages in a remote sandbox")]
#[command(version)]
pub struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a message (read from stdin when neither CODE nor --file is given)
    Eval {
        /// Message text, with or without code fences
        code: Option<String>,

        /// Read the message from a file
        #[arg(short, long, conflicts_with = "code")]
        file: Option<PathBuf>,

        /// Configuration file (default: ~/.config/evalgate/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the sandbox base URL
        #[arg(long)]
        sandbox_url: Option<Url>,

        /// Override the paste store base URL
        #[arg(long)]
        paste_url: Option<Url>,

        /// Sandbox deadline in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the code that would be sent to the sandbox, without running it
    Normalize {
        /// Message text, with or without code fences
        code: Option<String>,

        /// Read the message from a file
        #[arg(short, long, conflicts_with = "code")]
        file: Option<PathBuf>,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Destination (default: ~/.config/evalgate/config.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show {
        /// Configuration file (default: ~/.config/evalgate/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Eval {
            code,
            file,
            config,
            sandbox_url,
            paste_url,
            timeout,
            json,
        } => {
            let text = read_input(code, file)?;
            let options = EvalOptions {
                config,
                sandbox_url,
                paste_url,
                timeout_secs: timeout,
                json,
            };
            commands::execute_eval(text, options).await
        }
        Commands::Normalize { code, file } => {
            let text = read_input(code, file)?;
            commands::execute_normalize(&text)
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => commands::execute_config_init(path, force),
            ConfigAction::Show { config } => commands::execute_config_show(config),
            ConfigAction::Path => commands::execute_config_path(),
        },
    }
}

/// Log to stderr, and to `log_file` when given.
///
/// The returned guard flushes the file writer on drop and must outlive `main`'s work.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "info" };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            let file_appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "evalgate={},evalgate_sandbox={}",
                    log_level, log_level
                ))
            }),
        )
        .init();

    Ok(guard)
}

fn read_input(code: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read message from stdin")?;
    Ok(text)
}
