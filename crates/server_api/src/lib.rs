use shared::{
    domain::{Place, PlaceId},
    error::{ApiError, ErrorCode},
    protocol::AckResponse,
};
use storage::Storage;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_places(ctx: &ApiContext) -> Result<Vec<Place>, ApiError> {
    ctx.storage.list_places().await.map_err(internal)
}

/// Create-or-replace keyed by id. The whole record is stored as sent.
pub async fn save_place(ctx: &ApiContext, place: Place) -> Result<AckResponse, ApiError> {
    if place.id.is_blank() {
        return Err(ApiError::new(ErrorCode::Validation, "place id is required"));
    }
    ctx.storage.upsert_place(&place).await.map_err(internal)?;
    debug!(place_id = %place.id, "gateway: place saved");
    Ok(AckResponse::ok())
}

/// Idempotent: removing an unknown id still succeeds.
pub async fn delete_place(
    ctx: &ApiContext,
    id: Option<PlaceId>,
) -> Result<AckResponse, ApiError> {
    let id = id
        .filter(|id| !id.is_blank())
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, "place id is required"))?;
    let removed = ctx.storage.delete_place(&id).await.map_err(internal)?;
    info!(place_id = %id, removed, "gateway: place delete");
    Ok(AckResponse::ok())
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}
