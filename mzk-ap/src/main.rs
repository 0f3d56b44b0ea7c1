//! Audio Player (mzk-ap) - maintenance entry point
//!
//! The engine itself is embedded by the client application; this binary
//! inspects what the engine persisted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mzk_ap::db::{init_database, SqliteStore};
use mzk_ap::playback::PlayerStateSnapshot;
use mzk_ap::PlayerConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mzk-ap
#[derive(Parser, Debug)]
#[command(name = "mzk-ap")]
#[command(about = "Muzika audio player engine tools")]
#[command(version)]
struct Args {
    /// Data folder holding the player database
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "MZK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the persisted player state
    State {
        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mzk_ap=info,mzk_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    info!(
        "mzk-ap {} ({}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("MZK_SOURCE_REVISION"),
        env!("MZK_BUILT_AT"),
        env!("MZK_BUILD_PROFILE")
    );

    let config_file = args.config.clone().or_else(mzk_common::config::config_file_path);
    let data_folder =
        mzk_common::config::resolve_data_folder(args.data_folder.as_deref(), config_file.as_deref());
    let config = PlayerConfig::load(config_file.as_deref()).context("Failed to load configuration")?;

    info!("Data folder: {}", data_folder.display());

    match args.command {
        Command::State { json } => print_state(&config, &data_folder, json).await,
    }
}

async fn print_state(config: &PlayerConfig, data_folder: &std::path::Path, json: bool) -> Result<()> {
    let db_path = config.database_path(data_folder);
    if !db_path.exists() {
        println!("No player database at {}", db_path.display());
        return Ok(());
    }

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    let store = SqliteStore::new(pool);

    let Some(snapshot) = PlayerStateSnapshot::read(&store)
        .await
        .context("Failed to read player state")?
    else {
        println!("No saved player state");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let position = snapshot
        .position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".to_string());
    let current = snapshot
        .position
        .and_then(|p| snapshot.tracks.get(p))
        .map(String::as_str)
        .unwrap_or("-");

    println!("Shuffle:  {}", snapshot.shuffle);
    println!("Repeat:   {}", snapshot.repeat);
    println!("Position: {} ({})", position, current);
    println!("Tracks:   {} (original order: {})", snapshot.tracks.len(), snapshot.original.len());
    println!("Seek:     {}ms", snapshot.seek_ms);
    if let Some(settings) = &snapshot.settings {
        println!("Settings: {:?}", settings);
    }
    Ok(())
}
