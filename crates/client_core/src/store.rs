//! Local-first place list.
//!
//! Every mutation lands in memory before it returns. Mutations that touch the
//! remote store then spawn an independent propagation task which the store never
//! awaits; a failed propagation is reported through `tracing` and
//! [`StoreEvent::SyncFailed`] and never rolls local state back.

use std::{collections::HashSet, future::Future, sync::Arc};

use futures::{future::join_all, FutureExt};
use shared::domain::{Coordinate, Enrichment, Place, PlaceId};
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    classify::reclassify_place,
    error::{ReorderError, SyncError, ValidationError},
    regions::{group_by_region, plan_region_move, RegionGroup, RegionMove},
    sync::PlaceSync,
};

/// Finished propagation handles are only collected past this many outstanding entries.
const PENDING_PRUNE_THRESHOLD: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub op: SyncOp,
    pub place_id: PlaceId,
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Diagnostics emitted by the store. Nothing here is ever surfaced as an error return.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Loaded {
        count: usize,
    },
    LoadFailed {
        error: String,
    },
    SyncFailed {
        op: SyncOp,
        place_id: PlaceId,
        error: String,
    },
}

/// Field replacements for [`PlaceStore::patch`]. Never carries `category_type` or `region`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacePatch {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub raw_category: Option<String>,
    pub address: Option<String>,
    pub normalized_address: Option<String>,
    pub coordinate: Option<Coordinate>,
    /// `Some(None)` clears the link.
    pub link: Option<Option<String>>,
    pub enrichment: Option<Enrichment>,
}

impl PlacePatch {
    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Self::default()
        }
    }

    pub fn enrichment(enrichment: Enrichment) -> Self {
        Self {
            enrichment: Some(enrichment),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to(self, place: &mut Place) {
        if let Some(name) = self.name {
            place.name = name;
        }
        if let Some(comment) = self.comment {
            place.comment = comment;
        }
        if let Some(raw_category) = self.raw_category {
            place.raw_category = raw_category;
        }
        if let Some(address) = self.address {
            place.address = address;
        }
        if let Some(normalized_address) = self.normalized_address {
            place.normalized_address = normalized_address;
        }
        if let Some(coordinate) = self.coordinate {
            place.coordinate = coordinate;
        }
        if let Some(link) = self.link {
            place.link = link;
        }
        if let Some(enrichment) = self.enrichment {
            place.enrichment = enrichment;
        }
    }
}

pub struct PlaceStore {
    sync: Arc<dyn PlaceSync>,
    runtime: Handle,
    places: Vec<Place>,
    selected: Option<PlaceId>,
    pending: Vec<(u64, JoinHandle<SyncOutcome>)>,
    /// Outcomes collected from finished handles, drained by `settle`.
    finished: Vec<(u64, SyncOutcome)>,
    dispatched: u64,
    events: broadcast::Sender<StoreEvent>,
}

impl PlaceStore {
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use [`PlaceStore::with_runtime`] there.
    pub fn new(sync: Arc<dyn PlaceSync>) -> Self {
        Self::with_runtime(sync, Handle::current())
    }

    pub fn with_runtime(sync: Arc<dyn PlaceSync>, runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            sync,
            runtime,
            places: Vec::new(),
            selected: None,
            pending: Vec::new(),
            finished: Vec::new(),
            dispatched: 0,
            events,
        }
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, id: &PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| place.id == *id)
    }

    pub fn selected(&self) -> Option<&PlaceId> {
        self.selected.as_ref()
    }

    pub fn selected_place(&self) -> Option<&Place> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn regions(&self) -> Vec<RegionGroup<'_>> {
        group_by_region(&self.places)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Number of dispatched propagations not yet collected by [`PlaceStore::settle`].
    pub fn pending_syncs(&self) -> usize {
        self.pending.iter().filter(|(_, task)| !task.is_finished()).count()
    }

    /// Replaces the list with the remote snapshot. On failure the list is left as it was.
    pub async fn load(&mut self) {
        match self.sync.fetch_all().await {
            Ok(places) => {
                let places = dedupe_by_id(places);
                info!(count = places.len(), "store: loaded remote snapshot");
                let count = places.len();
                self.places = places;
                let _ = self.events.send(StoreEvent::Loaded { count });
            }
            Err(err) => {
                warn!(error = %err, "store: load failed; keeping local list");
                let _ = self.events.send(StoreEvent::LoadFailed {
                    error: err.to_string(),
                });
            }
        }
    }

    /// Appends a new place. The id must be non-blank and not already listed.
    pub fn insert(&mut self, place: Place) -> Result<(), ValidationError> {
        if place.id.is_blank() {
            return Err(ValidationError::MissingId);
        }
        if self.get(&place.id).is_some() {
            return Err(ValidationError::DuplicateId(place.id));
        }
        self.places.push(place.clone());
        self.dispatch_upsert(place);
        Ok(())
    }

    /// Replaces the place with the same id in position, or appends it.
    pub fn upsert(&mut self, place: Place) -> Result<(), ValidationError> {
        if place.id.is_blank() {
            return Err(ValidationError::MissingId);
        }
        match self.places.iter_mut().find(|existing| existing.id == place.id) {
            Some(existing) => *existing = place.clone(),
            None => self.places.push(place.clone()),
        }
        self.dispatch_upsert(place);
        Ok(())
    }

    /// Removing an unknown id is a no-op locally but still issues the remote delete.
    pub fn remove(&mut self, id: &PlaceId) {
        self.places.retain(|place| place.id != *id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.dispatch_delete(id.clone());
    }

    /// Applies the given fields and pushes the whole updated record. Returns whether
    /// anything was applied.
    pub fn patch(&mut self, id: &PlaceId, patch: PlacePatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(place) = self.places.iter_mut().find(|place| place.id == *id) else {
            return false;
        };
        patch.apply_to(place);
        let updated = place.clone();
        self.dispatch_upsert(updated);
        true
    }

    pub fn update_comment(&mut self, id: &PlaceId, comment: impl Into<String>) -> bool {
        self.patch(id, PlacePatch::comment(comment))
    }

    /// Recomputes category and region from the current raw text. Pushes only on change.
    pub fn reclassify(&mut self, id: &PlaceId) -> bool {
        let Some(place) = self.places.iter_mut().find(|place| place.id == *id) else {
            return false;
        };
        if !reclassify_place(place) {
            return false;
        }
        let updated = place.clone();
        self.dispatch_upsert(updated);
        true
    }

    /// Swaps in a caller-built sequence without checking it is a permutation of the
    /// current one. Order is local only; nothing is sent to the remote store.
    pub fn reorder(&mut self, sequence: Vec<Place>) {
        self.places = sequence;
    }

    pub fn move_within_region(&mut self, mv: &RegionMove) -> Result<(), ReorderError> {
        let sequence = plan_region_move(&self.places, mv)?;
        self.reorder(sequence);
        Ok(())
    }

    /// Selection of an id that is not (yet) listed is tolerated.
    pub fn select(&mut self, id: Option<PlaceId>) {
        self.selected = id;
    }

    /// Waits for every tracked propagation and returns their outcomes in dispatch order.
    pub async fn settle(&mut self) -> Vec<SyncOutcome> {
        let (seqs, tasks): (Vec<u64>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().unzip();
        let mut outcomes = std::mem::take(&mut self.finished);
        for (seq, joined) in seqs.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(outcome) => outcomes.push((seq, outcome)),
                Err(err) => warn!(error = %err, "store: propagation task did not complete"),
            }
        }
        outcomes.sort_by_key(|(seq, _)| *seq);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Moves outcomes of finished handles into `finished` so the handle list stays bounded.
    fn collect_finished(&mut self) {
        let mut running = Vec::with_capacity(self.pending.len());
        for (seq, mut task) in std::mem::take(&mut self.pending) {
            if !task.is_finished() {
                running.push((seq, task));
                continue;
            }
            match (&mut task).now_or_never() {
                Some(Ok(outcome)) => self.finished.push((seq, outcome)),
                Some(Err(err)) => warn!(error = %err, "store: propagation task did not complete"),
                None => running.push((seq, task)),
            }
        }
        self.pending = running;
    }

    fn dispatch_upsert(&mut self, place: Place) {
        let sync = Arc::clone(&self.sync);
        let place_id = place.id.clone();
        self.track(SyncOp::Upsert, place_id, async move {
            sync.upsert(&place).await
        });
    }

    fn dispatch_delete(&mut self, id: PlaceId) {
        let sync = Arc::clone(&self.sync);
        let place_id = id.clone();
        self.track(SyncOp::Delete, place_id, async move { sync.delete(&id).await });
    }

    fn track<F>(&mut self, op: SyncOp, place_id: PlaceId, call: F)
    where
        F: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        if self.pending.len() >= PENDING_PRUNE_THRESHOLD {
            self.collect_finished();
        }

        let events = self.events.clone();
        let task = self.runtime.spawn(async move {
            match call.await {
                Ok(()) => {
                    debug!(place_id = %place_id, ?op, "store: propagated");
                    SyncOutcome {
                        op,
                        place_id,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!(
                        place_id = %place_id,
                        ?op,
                        error = %err,
                        "store: propagation failed; local state kept"
                    );
                    let error = err.to_string();
                    let _ = events.send(StoreEvent::SyncFailed {
                        op,
                        place_id: place_id.clone(),
                        error: error.clone(),
                    });
                    SyncOutcome {
                        op,
                        place_id,
                        error: Some(error),
                    }
                }
            }
        });
        self.pending.push((self.dispatched, task));
        self.dispatched += 1;
    }
}

fn dedupe_by_id(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| {
            let fresh = seen.insert(place.id.clone());
            if !fresh {
                warn!(place_id = %place.id, "store: dropping duplicate id from snapshot");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
