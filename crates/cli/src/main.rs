//! Tagreaper CLI - reaper command

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod cmd;

use cmd::SelectionArgs;

/// Tagreaper - delete container images no workload uses anymore
#[derive(Parser)]
#[command(name = "reaper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/tagreaper/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which images would be deleted
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old images that no workload uses
    Prune {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path {
        /// Write the example config if the file does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Plan { selection, json } => cmd::plan::run(config_path, &selection, json).await,
        Commands::Prune { selection, yes } => cmd::prune::run(config_path, &selection, yes).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => cmd::config::run_show(config_path).await,
            ConfigCommands::Path { create } => cmd::config::run_path(config_path, create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}

/// Logs go to stderr so stdout stays parseable
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
