//! TickerLens CLI — the main entry point.
//!
//! Commands:
//! - `bundle`   — Assemble and print the context bundle for a snapshot
//! - `analyze`  — Assemble, invoke the model, print the JSON analysis
//! - `config`   — Initialize, show or locate the config file
//!
//! Exit codes: 0 success, 1 I/O, 2 configuration, 3 no data, 4 model failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::{CliError, load_config};

#[derive(Parser)]
#[command(
    name = "tickerlens",
    about = "TickerLens — budgeted market-data bundles and resilient LLM analysis",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.tickerlens/config.toml
    #[arg(long, global = true, env = "TICKERLENS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble and print the context bundle for a snapshot
    Bundle {
        /// JSON snapshot of resolved fetcher output
        snapshot: PathBuf,

        /// Override the token budget
        #[arg(long)]
        context_tokens: Option<usize>,
    },

    /// Assemble the bundle, invoke the model and print the analysis
    Analyze {
        /// JSON snapshot of resolved fetcher output
        snapshot: PathBuf,

        /// Write the analysis JSON to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override the token budget
        #[arg(long)]
        context_tokens: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Bundle {
            snapshot,
            context_tokens,
        } => {
            let config = load_config(config_path, context_tokens)?;
            commands::bundle::run(&config, &snapshot)
        }
        Commands::Analyze {
            snapshot,
            out,
            context_tokens,
        } => {
            let config = load_config(config_path, context_tokens)?;
            commands::analyze::run(&config, &snapshot, out.as_deref()).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_cmd::init(force),
            ConfigAction::Show => commands::config_cmd::show(&load_config(config_path, None)?),
            ConfigAction::Path => commands::config_cmd::path(),
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.fault_class() {
                Some(class) => tracing::error!(exit_code = e.exit_code(), ?class, "{e}"),
                None => tracing::error!(exit_code = e.exit_code(), "{e}"),
            }
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
