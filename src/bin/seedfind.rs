//! CLI binary for seedfind.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use seedfind::{AppConfig, SearchMode, SearchRequest, SearchService};
use tracing_subscriber::EnvFilter;

/// seedfind: search several torrent indexes at once.
#[derive(Parser)]
#[command(name = "seedfind", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search every selected source and print ranked results as JSON.
    Search {
        /// Search terms.
        query: String,

        /// Cache behaviour.
        #[arg(long, value_enum, default_value_t = ModeArg::Scraping)]
        mode: ModeArg,

        /// Query at most this many active sources.
        #[arg(long, default_value_t = 5)]
        max_sites: usize,

        /// Skip query expansion and rank by seeds only.
        #[arg(long)]
        no_ai: bool,
    },

    /// List the source catalog.
    Sites,

    /// Print version, AI availability and active source count.
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Scraping,
    AiOrganize,
    Memory,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Scraping => SearchMode::Scraping,
            ModeArg::AiOrganize => SearchMode::AiOrganize,
            ModeArg::Memory => SearchMode::Memory,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seedfind=info,seedfind_search=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        AppConfig::from_file(path)?
    } else {
        AppConfig::default()
    };

    let service = SearchService::from_config(&config)?;
    let outcome = run(&service, cli.command).await;
    service.shutdown().await;
    outcome
}

async fn run(service: &SearchService, command: Command) -> anyhow::Result<()> {
    let output = match command {
        Command::Search {
            query,
            mode,
            max_sites,
            no_ai,
        } => {
            let request = SearchRequest {
                query,
                mode: mode.into(),
                max_sites,
                use_ai: !no_ai,
            };
            serde_json::to_string_pretty(&service.search(&request).await?)?
        }
        Command::Sites => serde_json::to_string_pretty(&service.sites())?,
        Command::Status => serde_json::to_string_pretty(&service.status())?,
    };
    println!("{output}");
    Ok(())
}
