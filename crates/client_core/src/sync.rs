use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Place, PlaceId},
    error::{ApiError, ApiException, ErrorCode},
    protocol::PLACES_ROUTE,
};
use url::Url;

use crate::error::SyncError;

const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote CRUD boundary for the place list. Implementations hold no local state.
#[async_trait]
pub trait PlaceSync: Send + Sync {
    /// Remote-side order, which is not necessarily the locally displayed order.
    async fn fetch_all(&self) -> Result<Vec<Place>, SyncError>;
    /// Create-or-replace keyed by id.
    async fn upsert(&self, place: &Place) -> Result<(), SyncError>;
    /// Deleting an id the remote never had succeeds.
    async fn delete(&self, id: &PlaceId) -> Result<(), SyncError>;
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl SyncConfig {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            timeout: DEFAULT_SYNC_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn places_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(PLACES_ROUTE.trim_start_matches('/'))
    }
}

/// Persistence gateway client over HTTP.
pub struct HttpPlaceSync {
    http: Client,
    places_url: Url,
}

impl HttpPlaceSync {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let places_url = config
            .places_url()
            .map_err(|err| SyncError::Unavailable(format!("invalid gateway url: {err}")))?;
        Ok(Self { http, places_url })
    }

    pub fn places_url(&self) -> &Url {
        &self.places_url
    }
}

#[async_trait]
impl PlaceSync for HttpPlaceSync {
    async fn fetch_all(&self) -> Result<Vec<Place>, SyncError> {
        let res = self.http.get(self.places_url.clone()).send().await?;
        let body = ensure_success(res).await?.bytes().await?;
        parse_place_list(&body)
    }

    async fn upsert(&self, place: &Place) -> Result<(), SyncError> {
        let res = self
            .http
            .post(self.places_url.clone())
            .json(place)
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }

    async fn delete(&self, id: &PlaceId) -> Result<(), SyncError> {
        let res = self
            .http
            .delete(self.places_url.clone())
            .query(&[("id", id.as_str())])
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }
}

async fn ensure_success(res: Response) -> Result<Response, SyncError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body.trim().to_string()
        };
        ApiError::new(ErrorCode::Internal, message)
    });
    Err(SyncError::Rejected {
        status: status.as_u16(),
        source: ApiException::from(api_error),
    })
}

/// Typed view of a gateway listing. Any record without a usable id rejects the whole payload.
pub fn parse_place_list(body: &[u8]) -> Result<Vec<Place>, SyncError> {
    let places: Vec<Place> =
        serde_json::from_slice(body).map_err(|err| SyncError::Malformed(err.to_string()))?;
    if let Some(index) = places.iter().position(|place| place.id.is_blank()) {
        return Err(SyncError::Malformed(format!(
            "record at position {index} has no id"
        )));
    }
    Ok(places)
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
