mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod state;
mod taxonomy;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::pipeline::Stage;
use crate::state::AppState;
use crate::taxonomy::audit::{audit_collisions, DEFAULT_SAMPLE};

#[derive(Parser)]
#[command(name = "atlas", version)]
#[command(about = "Skill taxonomy pipeline for scraped job offers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, canonicalize, deduplicate and link skills
    Normalize {
        #[arg(short, long, value_enum, default_value_t = Stage::All)]
        stage: Stage,
        /// Truncate the skill taxonomy (and its offer links) first
        #[arg(long)]
        reset: bool,
    },
    /// Print raw strings canonicalized inconsistently, as JSON
    Audit {
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE)]
        sample: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on a missing database location)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Atlas v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    match cli.command {
        Commands::Normalize { stage, reset } => {
            let state = AppState::new(db, config)?;
            let report = pipeline::run(&state, stage, reset).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Audit { sample } => {
            let report = audit_collisions(&db, sample).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
