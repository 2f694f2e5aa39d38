//! Foreground flows that build or refresh a place from third-party lookups.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::domain::{Coordinate, Enrichment, Place, PlaceId};
use tracing::{info, warn};
use url::Url;

use crate::{
    classify::{classify_category, derive_region},
    error::{CreateError, ProviderError},
    providers::{
        strip_tags, GoogleGeocoder, HttpEnricher, NaverLocalSearch, PageTitleFetcher,
        ProviderConfig,
    },
    store::PlaceStore,
};

const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1";

/// Resolves a shared link to the page title it advertises.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve_title(&self, url: &str) -> Result<Option<String>, ProviderError>;
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Best match first.
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ProviderError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the provider answered but found nothing.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError>;
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, name: &str, address: &str) -> Result<Enrichment, ProviderError>;
}

/// One local-search hit. `title` may still carry highlight markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceCandidate {
    pub title: String,
    pub category: String,
    pub address: String,
    pub road_address: String,
    pub link: String,
    pub telephone: String,
}

impl PlaceCandidate {
    fn lookup_address(&self) -> &str {
        if self.road_address.trim().is_empty() {
            &self.address
        } else {
            &self.road_address
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPlaceRequest {
    /// Free-text name or a shared map link.
    pub query: String,
    pub comment: String,
}

impl NewPlaceRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

pub struct PlaceCreator {
    titles: Arc<dyn TitleResolver>,
    search: Arc<dyn PlaceSearch>,
    geocoder: Arc<dyn Geocoder>,
    enricher: Arc<dyn Enricher>,
}

impl PlaceCreator {
    pub fn new(
        titles: Arc<dyn TitleResolver>,
        search: Arc<dyn PlaceSearch>,
        geocoder: Arc<dyn Geocoder>,
        enricher: Arc<dyn Enricher>,
    ) -> Self {
        Self {
            titles,
            search,
            geocoder,
            enricher,
        }
    }

    /// Wires the HTTP adapters. Missing credentials surface later as
    /// [`ProviderError::NotConfigured`] from the affected lookup.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = config.http_client()?;
        Ok(Self::new(
            Arc::new(PageTitleFetcher::new(http.clone())),
            Arc::new(NaverLocalSearch::new(http.clone(), config)),
            Arc::new(GoogleGeocoder::new(http.clone(), config)),
            Arc::new(HttpEnricher::new(http, config)),
        ))
    }

    /// Turns a link into a searchable name; anything else passes through trimmed.
    pub async fn resolve(&self, query: &str) -> String {
        let query = query.trim();
        if !query.starts_with("http") {
            return query.to_string();
        }
        match self.titles.resolve_title(query).await {
            Ok(Some(title)) if !title.trim().is_empty() => title.trim().to_string(),
            Ok(_) => query.to_string(),
            Err(err) => {
                warn!(error = %err, "create: title lookup failed; searching the raw link");
                query.to_string()
            }
        }
    }

    /// Looks the place up, builds the record, inserts it and selects it.
    pub async fn create(
        &self,
        store: &mut PlaceStore,
        request: NewPlaceRequest,
    ) -> Result<Place, CreateError> {
        if request.query.trim().is_empty() {
            return Err(CreateError::EmptyQuery);
        }

        let query = self.resolve(&request.query).await;
        let candidate = self
            .search
            .search(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CreateError::NoMatch(query.clone()))?;

        let coordinate = match self.geocoder.geocode(candidate.lookup_address()).await {
            Ok(Some(coordinate)) if coordinate.is_valid() => coordinate,
            Ok(_) => Coordinate::FALLBACK,
            Err(err) => {
                warn!(error = %err, "create: geocoding failed; using fallback coordinate");
                Coordinate::FALLBACK
            }
        };

        let place = build_place(&candidate, coordinate, request.comment);
        store.insert(place.clone())?;
        store.select(Some(place.id.clone()));
        info!(place_id = %place.id, name = %place.name, "create: added place");
        Ok(place)
    }

    /// Fetches fresh enrichment for a listed place and pushes the merged record.
    pub async fn refresh_enrichment(
        &self,
        store: &mut PlaceStore,
        id: &PlaceId,
    ) -> Result<Place, CreateError> {
        let current = store
            .get(id)
            .cloned()
            .ok_or_else(|| CreateError::UnknownPlace(id.clone()))?;

        let mut enrichment = self
            .enricher
            .enrich(&current.name, current.lookup_address())
            .await?;
        enrichment.last_updated = Some(Utc::now());

        let updated = Place {
            enrichment,
            ..current
        };
        store.upsert(updated.clone())?;
        info!(place_id = %id, "create: refreshed enrichment");
        Ok(updated)
    }
}

fn build_place(candidate: &PlaceCandidate, coordinate: Coordinate, comment: String) -> Place {
    let name = strip_tags(&candidate.title);
    let link = map_search_link(&name, candidate.lookup_address());
    Place {
        id: PlaceId::generate(),
        category_type: classify_category(&candidate.category),
        region: derive_region(&candidate.address),
        raw_category: candidate.category.clone(),
        address: candidate.address.clone(),
        normalized_address: candidate.road_address.clone(),
        coordinate,
        comment,
        link,
        enrichment: Enrichment::default(),
        name,
    }
}

/// Map search URL for `name address`, or `None` if it cannot be encoded.
pub fn map_search_link(name: &str, address: &str) -> Option<String> {
    let query = format!("{name} {address}");
    Url::parse_with_params(MAP_SEARCH_URL, &[("query", query.trim())])
        .ok()
        .map(String::from)
}

#[cfg(test)]
#[path = "tests/create_tests.rs"]
mod tests;
