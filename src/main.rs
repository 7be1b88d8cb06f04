use anyhow::{Context, Result};
use book_price_search::config::LogFormat;
use book_price_search::{build_search_tool, logging, Config, Server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "book-price-search")]
#[command(about = "Search book offers across an auction marketplace and a book catalog")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP search endpoint
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one search and print the grouped result as JSON
    Search {
        /// Search phrase
        #[arg(required = true, num_args = 1..)]
        phrase: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    logging::init(&config.logging)?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate().context("Invalid server settings")?;

            let tool = build_search_tool(&config)?;
            info!(
                "Starting book price search v{} on {}:{}",
                env!("CARGO_PKG_VERSION"),
                config.server.host,
                config.server.port
            );
            Server::new(config.server.clone(), Arc::new(tool)).run().await?;
        }
        Command::Search { phrase } => {
            let tool = build_search_tool(&config)?;
            let response = tool.search(&phrase.join(" ")).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
