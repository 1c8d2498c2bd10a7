//! CLI parser and dispatch to command-specific modules.

mod check;
mod event;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::helpers::load_config;

#[derive(Parser)]
#[command(name = "docpipe")]
#[command(about = "Fetch, scan and extract text from uploaded documents")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON); discovered automatically if omitted
    #[arg(short, long, global = true, env = "DOCPIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on a single stored object
    Run {
        /// Container (bucket) holding the object
        container: String,
        /// Object key
        key: String,
        /// Write the extracted text to this file on success
        #[arg(long)]
        text_out: Option<PathBuf>,
    },

    /// Run the pipeline for every record of a storage notification
    Event {
        /// Notification JSON file, or - for stdin
        #[arg(default_value = "-")]
        source: String,
        /// Documents processed at once (defaults to batch_concurrency)
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },

    /// Show configured backends and scanner availability
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Run {
            container,
            key,
            text_out,
        } => run::cmd_run(&config, &container, &key, text_out.as_deref()).await,
        Commands::Event {
            source,
            concurrency,
        } => event::cmd_event(&config, &source, concurrency).await,
        Commands::Check => check::cmd_check(&config).await,
    }
}
