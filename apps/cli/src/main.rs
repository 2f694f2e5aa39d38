mod commands;
mod render;
mod shell;

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpPlaceSync, PlaceCreator, PlaceStore, ProviderConfig, StoreEvent, SyncConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::{PlaceCommand, Session};

#[derive(Parser, Debug)]
#[command(name = "placebook", about = "Keep a saved-place list in sync with a placebook server")]
struct Args {
    #[arg(long, env = "PLACEBOOK_SERVER_URL", default_value = "http://127.0.0.1:8787")]
    server_url: String,
    /// Per-request timeout for the server and lookup providers.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Place(PlaceCommand),
    /// Interactive session over one long-lived list.
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout_secs);

    let sync_config = SyncConfig::new(&args.server_url)
        .with_context(|| format!("invalid server url: {}", args.server_url))?
        .with_timeout(timeout);
    let sync = Arc::new(HttpPlaceSync::new(&sync_config)?);
    let creator = PlaceCreator::from_config(&ProviderConfig::from_env().with_timeout(timeout))?;
    let mut session = Session::new(PlaceStore::new(sync), creator);

    let mut events = session.store.subscribe();
    session.store.load().await;
    if let Ok(StoreEvent::LoadFailed { error }) = events.try_recv() {
        match args.command {
            Command::Shell => eprintln!("starting with an empty list: {error}"),
            Command::Place(_) => bail!("could not load places from {}: {error}", args.server_url),
        }
    }

    match args.command {
        Command::Place(command) => {
            session.run(command).await?;
            session.flush().await
        }
        Command::Shell => shell::run(&mut session).await,
    }
}
