use anyhow::{anyhow, bail, Result};
use clap::Subcommand;
use client_core::{NewPlaceRequest, PlaceCreator, PlaceFilter, PlaceStore, RegionMove};
use shared::domain::{CategoryType, PlaceId, Region};

use crate::render::{render_place, render_places};

#[derive(Subcommand, Debug)]
pub enum PlaceCommand {
    /// Show places grouped by region.
    List {
        #[arg(long)]
        region: Option<String>,
        /// Category label, e.g. 한식 or 디저트.
        #[arg(long, value_parser = parse_category)]
        category: Option<CategoryType>,
        #[arg(long)]
        json: bool,
    },
    /// Look a place up by name or shared map link and save it.
    Add {
        query: String,
        #[arg(long, default_value = "")]
        comment: String,
    },
    #[command(alias = "rm")]
    Remove { id: String },
    Comment { id: String, text: String },
    /// Fetch fresh business details for a place.
    Refresh { id: String },
    /// Recompute category and region from the stored text.
    Reclassify {
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Move a place inside its region. Order is not stored on the server.
    Move {
        #[arg(long)]
        region: String,
        from: usize,
        to: usize,
    },
}

fn parse_category(label: &str) -> Result<CategoryType, String> {
    CategoryType::parse_label(label).ok_or_else(|| {
        let known: Vec<_> = CategoryType::ALL.iter().map(|c| c.label()).collect();
        format!("unknown category '{}'; expected one of {}", label.trim(), known.join(", "))
    })
}

pub struct Session {
    pub store: PlaceStore,
    creator: PlaceCreator,
}

impl Session {
    pub fn new(store: PlaceStore, creator: PlaceCreator) -> Self {
        Self { store, creator }
    }

    pub async fn run(&mut self, command: PlaceCommand) -> Result<()> {
        match command {
            PlaceCommand::List {
                region,
                category,
                json,
            } => {
                let filter = PlaceFilter {
                    region: region.map(Region::new),
                    category,
                };
                if json {
                    let places: Vec<_> = filter.apply(self.store.places()).collect();
                    println!("{}", serde_json::to_string_pretty(&places)?);
                } else {
                    print!(
                        "{}",
                        render_places(self.store.places(), &filter, self.store.selected())
                    );
                }
            }
            PlaceCommand::Add { query, comment } => {
                let place = self
                    .creator
                    .create(&mut self.store, NewPlaceRequest::new(query).with_comment(comment))
                    .await?;
                println!("added {}", render_place(&place));
            }
            PlaceCommand::Remove { id } => {
                match self.find_id(&id)? {
                    Some(id) => {
                        self.store.remove(&id);
                        println!("removed {id}");
                    }
                    None => {
                        let id = PlaceId::new(id.trim());
                        self.store.remove(&id);
                        println!("{id} is not listed; delete sent anyway");
                    }
                }
            }
            PlaceCommand::Comment { id, text } => {
                let id = self.resolve_id(&id)?;
                self.store.update_comment(&id, text);
                println!("updated comment on {id}");
            }
            PlaceCommand::Refresh { id } => {
                let id = self.resolve_id(&id)?;
                let place = self.creator.refresh_enrichment(&mut self.store, &id).await?;
                println!("refreshed {}", render_place(&place));
            }
            PlaceCommand::Reclassify { id, all } => {
                let ids = match (id, all) {
                    (Some(id), false) => vec![self.resolve_id(&id)?],
                    (None, true) => self.store.places().iter().map(|p| p.id.clone()).collect(),
                    _ => bail!("pass a place id or --all"),
                };
                let changed = ids.iter().filter(|id| self.store.reclassify(id)).count();
                println!("reclassified {changed} of {} places", ids.len());
            }
            PlaceCommand::Move { region, from, to } => {
                let region = Region::new(region);
                self.store
                    .move_within_region(&RegionMove::within(region.clone(), from, to))?;
                let filter = PlaceFilter {
                    region: Some(region),
                    category: None,
                };
                print!(
                    "{}",
                    render_places(self.store.places(), &filter, self.store.selected())
                );
            }
        }
        Ok(())
    }

    /// Waits for outstanding propagations and fails if any of them did not land.
    pub async fn flush(&mut self) -> Result<()> {
        let failed: Vec<_> = self
            .store
            .settle()
            .await
            .into_iter()
            .filter_map(|outcome| {
                outcome
                    .error
                    .map(|error| format!("{:?} {}: {error}", outcome.op, outcome.place_id))
            })
            .collect();
        if failed.is_empty() {
            return Ok(());
        }
        bail!(
            "{} change(s) did not reach the server:\n  {}",
            failed.len(),
            failed.join("\n  ")
        )
    }

    pub fn resolve_id(&self, input: &str) -> Result<PlaceId> {
        self.find_id(input)?
            .ok_or_else(|| anyhow!("no place with id '{}'", input.trim()))
    }

    /// Exact id, or a prefix matching exactly one listed place.
    pub fn find_id(&self, input: &str) -> Result<Option<PlaceId>> {
        let input = input.trim();
        let exact = PlaceId::new(input);
        if self.store.get(&exact).is_some() {
            return Ok(Some(exact));
        }
        let mut matches = self
            .store
            .places()
            .iter()
            .filter(|place| !input.is_empty() && place.id.as_str().starts_with(input));
        match (matches.next(), matches.next()) {
            (Some(_), Some(_)) => bail!("'{input}' matches more than one place"),
            (found, _) => Ok(found.map(|place| place.id.clone())),
        }
    }
}
