use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::classify::reclassify_place;
use shared::domain::{Place, PlaceId};
use storage::Storage;

#[derive(Parser, Debug)]
#[command(name = "placebook-tools", about = "Maintenance commands for a placebook database")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/places.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every record as a JSON array, or write it to a file.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upsert records from a JSON array file.
    Import { file: PathBuf },
    Count,
    Delete { id: String },
    /// Recompute category and region on every stored record.
    ReclassifyAll {
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Export { out } => {
            let places = storage.list_places().await?;
            let json = serde_json::to_string_pretty(&places)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("exported {} places to {}", places.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let raw = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let places: Vec<Place> = serde_json::from_slice(&raw)
                .with_context(|| format!("{} is not a JSON array of places", file.display()))?;
            if let Some(index) = places.iter().position(|place| place.id.is_blank()) {
                bail!("record at position {index} has no id; nothing imported");
            }
            for place in &places {
                storage.upsert_place(place).await?;
            }
            println!("imported {} places", places.len());
        }
        Command::Count => {
            println!("{}", storage.count_places().await?);
        }
        Command::Delete { id } => {
            let id = PlaceId::new(id);
            if storage.delete_place(&id).await? {
                println!("deleted {id}");
            } else {
                println!("{id} was not stored");
            }
        }
        Command::ReclassifyAll { dry_run } => {
            let mut changed = 0usize;
            for mut place in storage.list_places().await? {
                let before = (place.category_type, place.region.clone());
                if !reclassify_place(&mut place) {
                    continue;
                }
                changed += 1;
                println!(
                    "{}: {}/{} -> {}/{}",
                    place.id, before.0, before.1, place.category_type, place.region
                );
                if !dry_run {
                    storage.upsert_place(&place).await?;
                }
            }
            let verb = if dry_run { "would change" } else { "changed" };
            println!("{verb} {changed} places");
        }
    }

    Ok(())
}
