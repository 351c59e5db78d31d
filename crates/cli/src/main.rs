//! Safina CLI entry point.
//!
//! Commands:
//! - `ask`:       Run a single query and print the JSON response
//! - `chat`:      Interactive session
//! - `providers`: Show provider availability
//! - `tools`:     List the advertised tool catalog
//! - `doctor`:    Diagnose configuration and data files

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "safina",
    about = "Safina — digital lending assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config.toml (defaults to ~/.safina/config.toml)
    #[arg(short, long, global = true, env = "SAFINA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query
    Ask {
        /// The query text
        query: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Preferred provider for this query
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Chat interactively on one session
    Chat {
        /// Preferred provider for every query
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Show provider availability
    Providers,

    /// List the tool catalog
    Tools,

    /// Diagnose configuration and data files
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Doctor reports config problems instead of failing on them
    if let Commands::Doctor = cli.command {
        return commands::doctor::run(cli.config.as_deref()).await;
    }

    let config = runtime::load_config(cli.config.as_deref())?;
    runtime::init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Ask {
            query,
            session,
            provider,
        } => commands::ask::run(&config, &query, session, provider).await?,
        Commands::Chat { provider } => commands::chat::run(&config, provider).await?,
        Commands::Providers => commands::providers::run(&config).await?,
        Commands::Tools => commands::tools::run(&config)?,
        Commands::Doctor => unreachable!("handled above"),
    }

    Ok(())
}
