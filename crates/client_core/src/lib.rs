pub mod classify;
pub mod create;
pub mod error;
pub mod memory_sync;
pub mod providers;
pub mod regions;
pub mod store;
pub mod sync;

pub use create::{NewPlaceRequest, PlaceCandidate, PlaceCreator};
pub use error::{CreateError, ProviderError, ReorderError, SyncError, ValidationError};
pub use memory_sync::InMemoryPlaceSync;
pub use providers::ProviderConfig;
pub use regions::{PlaceFilter, RegionGroup, RegionMove};
pub use store::{PlacePatch, PlaceStore, StoreEvent, SyncOp, SyncOutcome};
pub use sync::{HttpPlaceSync, PlaceSync, SyncConfig};
