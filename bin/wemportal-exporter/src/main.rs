mod commands;
mod exposition;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wemportal_core::Paths;

#[derive(Parser)]
#[command(name = "wemportal-exporter")]
#[command(about = "Prometheus exporter for the WEM portal specialist data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.wemportal-exporter/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve metrics over HTTP (long-running)
    Serve {
        /// Port to listen on (overrides config exporter.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config exporter.host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Run a single collection and print the exposition to stdout
    Scrape,

    /// List the label to metric mapping
    Catalog,

    /// Show the effective configuration
    Config {
        /// Write it to the config file if none exists yet
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let (plain, json) = if cli.log_json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };
    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { port, host } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::serve::run(config, host, port).await?;
        }
        Commands::Scrape => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::scrape::run(&config).await?;
        }
        Commands::Catalog => {
            commands::catalog::run().await?;
        }
        Commands::Config { write } => {
            let target = cli.config.clone().unwrap_or_else(|| Paths::new().config_file());
            let config = if target.exists() {
                commands::load_config(Some(target.as_path()))?
            } else {
                wemportal_core::Config::default()
            };
            let write_to = if write { Some(target.as_path()) } else { None };
            commands::config_cmd::run(&config, write_to).await?;
        }
    }

    Ok(())
}
