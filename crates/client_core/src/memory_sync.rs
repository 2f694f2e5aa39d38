use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use shared::domain::{Place, PlaceId};
use tokio::sync::Mutex;

use crate::{error::SyncError, sync::PlaceSync};

/// In-process stand-in for the persistence gateway with the same upsert/delete semantics.
#[derive(Default)]
pub struct InMemoryPlaceSync {
    records: Mutex<Vec<Place>>,
    failing: AtomicBool,
    fetch_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryPlaceSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_places(places: Vec<Place>) -> Self {
        Self {
            records: Mutex::new(places),
            ..Self::default()
        }
    }

    /// While set, every call fails as if the gateway were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<Place> {
        self.records.lock().await.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), SyncError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("in-memory gateway set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlaceSync for InMemoryPlaceSync {
    async fn fetch_all(&self) -> Result<Vec<Place>, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.snapshot().await)
    }

    async fn upsert(&self, place: &Place) -> Result<(), SyncError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|record| record.id == place.id) {
            Some(existing) => *existing = place.clone(),
            None => records.push(place.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &PlaceId) -> Result<(), SyncError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.records.lock().await.retain(|record| record.id != *id);
        Ok(())
    }
}
