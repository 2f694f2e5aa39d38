use serde::{Deserialize, Serialize};

use crate::domain::PlaceId;

/// Path of the place collection on the persistence gateway.
pub const PLACES_ROUTE: &str = "/api/places";

pub const HEALTH_ROUTE: &str = "/healthz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePlaceQuery {
    #[serde(default)]
    pub id: Option<PlaceId>,
}
