use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use howtobase::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "howtobase")]
#[command(about = "HowToBase Academy - achievements, XP and levels for Base builder tutorials")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.howtobase/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the level table
    Levels,

    /// Show the level, title and progress for an XP total
    Level {
        /// Total XP (negative values count as 0)
        #[arg(allow_negative_numbers = true)]
        xp: i64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List achievements
    Catalog {
        /// Only show this category (wallet, transaction, swap, nft, identity, defi, advanced)
        #[arg(long)]
        category: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Complete achievements in order on a fresh session and show what happens
    Simulate {
        /// Achievement ids, e.g. wallet_connected first_swap
        ids: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run the progression HTTP API
    Serve {
        /// Override [server].host
        #[arg(long)]
        host: Option<String>,

        /// Override [server].port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Levels => cli::levels::levels_command()?,
        Commands::Level { xp, json } => cli::levels::level_command(xp, json)?,
        Commands::Catalog { category, json } => cli::catalog::catalog_command(category, json)?,
        Commands::Simulate { ids, json } => cli::simulate::simulate_command(&ids, json)?,
        Commands::Serve { host, port } => {
            let config = Config::load(cli.config.as_deref())?;
            cli::serve::serve_command(config, host, port)?;
        }
        Commands::Init { force } => cli::init::init_command(cli.config, force)?,
    }

    Ok(())
}
