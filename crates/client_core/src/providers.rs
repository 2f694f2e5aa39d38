//! HTTP adapters for the lookup services used by [`crate::create`], plus the
//! parsers that turn their untyped payloads into domain values.

use std::{sync::OnceLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use shared::domain::{Coordinate, Enrichment};

use crate::{
    create::{Enricher, Geocoder, PlaceCandidate, PlaceSearch, TitleResolver},
    error::ProviderError,
};

pub const DEFAULT_NAVER_SEARCH_URL: &str = "https://openapi.naver.com/v1/search/local.json";
pub const DEFAULT_GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const SEARCH_RESULT_COUNT: &str = "5";

/// Suffixes map sites append to shared page titles.
const TITLE_NOISE: &[&str] = &[
    " : 네이버 플레이스",
    "네이버 MY PLACE",
    " - 네이버 지도",
    "| 네이버 지도",
];

static OG_TITLE: OnceLock<Regex> = OnceLock::new();
static HTML_TITLE: OnceLock<Regex> = OnceLock::new();
static HTML_TAG: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub google_api_key: Option<String>,
    pub enrich_url: Option<String>,
    pub naver_search_url: String,
    pub google_geocode_url: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            naver_client_id: None,
            naver_client_secret: None,
            google_api_key: None,
            enrich_url: None,
            naver_search_url: DEFAULT_NAVER_SEARCH_URL.to_string(),
            google_geocode_url: DEFAULT_GOOGLE_GEOCODE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            naver_client_id: read("NAVER_CLIENT_ID"),
            naver_client_secret: read("NAVER_CLIENT_SECRET"),
            google_api_key: read("GOOGLE_MAPS_API_KEY"),
            enrich_url: read("PLACEBOOK_ENRICH_URL"),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn http_client(&self) -> Result<Client, ProviderError> {
        Ok(Client::builder()
            .timeout(self.timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?)
    }
}

/// Title a shared page advertises: `og:title` first, then `<title>`, with map
/// site noise removed. `None` when neither yields text.
pub fn extract_page_title(html: &str) -> Option<String> {
    let og = OG_TITLE.get_or_init(|| {
        Regex::new(r#"(?i)<meta\s+property="og:title"\s+content="([^"]+)""#)
            .expect("this regex should always be valid")
    });
    let title = HTML_TITLE.get_or_init(|| {
        Regex::new(r"(?i)<title>([^<]+)</title>").expect("this regex should always be valid")
    });

    let raw = og
        .captures(html)
        .or_else(|| title.captures(html))
        .and_then(|caps| caps.get(1))?
        .as_str();

    let cleaned = TITLE_NOISE
        .iter()
        .fold(raw.to_string(), |acc, noise| acc.replace(noise, ""));
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Removes markup such as the `<b>` highlights local search puts in titles.
pub fn strip_tags(text: &str) -> String {
    let tag = HTML_TAG
        .get_or_init(|| Regex::new(r"<[^>]*>?").expect("this regex should always be valid"));
    tag.replace_all(text, "").trim().to_string()
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    items: Option<Vec<SearchItem>>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchItem {
    title: String,
    link: String,
    category: String,
    telephone: String,
    address: String,
    road_address: String,
}

pub fn parse_search_response(body: &[u8]) -> Result<Vec<PlaceCandidate>, ProviderError> {
    let reply: SearchReply =
        serde_json::from_slice(body).map_err(|err| ProviderError::Malformed(err.to_string()))?;
    if let Some(message) = reply.error_message {
        return Err(ProviderError::Rejected {
            status: None,
            message,
        });
    }
    let items = reply
        .items
        .ok_or_else(|| ProviderError::Malformed("search reply has no items".into()))?;
    Ok(items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .map(|item| PlaceCandidate {
            title: item.title,
            category: item.category,
            address: item.address,
            road_address: item.road_address,
            link: item.link,
            telephone: item.telephone,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct GeocodeReply {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: Coordinate,
}

/// `Ok(None)` for a well-formed reply without results.
pub fn parse_geocode_response(body: &[u8]) -> Result<Option<Coordinate>, ProviderError> {
    let reply: GeocodeReply =
        serde_json::from_slice(body).map_err(|err| ProviderError::Malformed(err.to_string()))?;
    match reply.status.as_str() {
        "OK" => Ok(reply
            .results
            .into_iter()
            .next()
            .map(|result| result.geometry.location)
            .filter(Coordinate::is_valid)),
        "ZERO_RESULTS" => Ok(None),
        status => Err(ProviderError::Rejected {
            status: None,
            message: reply
                .error_message
                .map(|message| format!("{status}: {message}"))
                .unwrap_or_else(|| status.to_string()),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct EnrichmentReply {
    error: Option<String>,
    #[serde(flatten)]
    fields: Enrichment,
}

/// Empty strings are treated as "not found". Any `lastUpdated` in the reply is dropped.
pub fn parse_enrichment_response(body: &[u8]) -> Result<Enrichment, ProviderError> {
    let reply: EnrichmentReply =
        serde_json::from_slice(body).map_err(|err| ProviderError::Malformed(err.to_string()))?;
    if let Some(message) = reply.error.filter(|message| !message.trim().is_empty()) {
        return Err(ProviderError::Rejected {
            status: None,
            message,
        });
    }

    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let fields = reply.fields;
    Ok(Enrichment {
        status: non_blank(fields.status),
        business_hours: non_blank(fields.business_hours),
        phone_number: non_blank(fields.phone_number),
        recent_vibes: non_blank(fields.recent_vibes),
        price_range: non_blank(fields.price_range),
        last_updated: None,
    })
}

/// Reads the body of a 2xx reply. Otherwise surfaces the provider's `error`
/// field, or the raw text, as a rejection.
async fn success_body(res: Response) -> Result<Vec<u8>, ProviderError> {
    let status = res.status();
    let body = res.bytes().await?;
    if status.is_success() {
        return Ok(body.to_vec());
    }

    let message = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            ["error", "errorMessage", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    Err(ProviderError::Rejected {
        status: Some(status.as_u16()),
        message,
    })
}

pub struct PageTitleFetcher {
    http: Client,
}

impl PageTitleFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TitleResolver for PageTitleFetcher {
    async fn resolve_title(&self, url: &str) -> Result<Option<String>, ProviderError> {
        let res = self.http.get(url).send().await?;
        let body = success_body(res).await?;
        Ok(extract_page_title(&String::from_utf8_lossy(&body)))
    }
}

pub struct NaverLocalSearch {
    http: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl NaverLocalSearch {
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        let credentials = config
            .naver_client_id
            .clone()
            .zip(config.naver_client_secret.clone());
        Self {
            http,
            endpoint: config.naver_search_url.clone(),
            credentials,
        }
    }
}

#[async_trait]
impl PlaceSearch for NaverLocalSearch {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ProviderError> {
        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or(ProviderError::NotConfigured("NAVER_CLIENT_ID / NAVER_CLIENT_SECRET"))?;
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("display", SEARCH_RESULT_COUNT),
                ("start", "1"),
                ("sort", "random"),
            ])
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .send()
            .await?;
        parse_search_response(&success_body(res).await?)
    }
}

pub struct GoogleGeocoder {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            endpoint: config.google_geocode_url.clone(),
            api_key: config.google_api_key.clone(),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("GOOGLE_MAPS_API_KEY"))?;
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("address", address), ("key", api_key)])
            .send()
            .await?;
        parse_geocode_response(&success_body(res).await?)
    }
}

/// Client for an enrichment service taking `{name, address}` and answering with
/// the camelCase [`Enrichment`] fields.
pub struct HttpEnricher {
    http: Client,
    endpoint: Option<String>,
}

impl HttpEnricher {
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            endpoint: config.enrich_url.clone(),
        }
    }
}

#[async_trait]
impl Enricher for HttpEnricher {
    async fn enrich(&self, name: &str, address: &str) -> Result<Enrichment, ProviderError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ProviderError::NotConfigured("PLACEBOOK_ENRICH_URL"))?;
        let res = self
            .http
            .post(endpoint)
            .json(&json!({ "name": name, "address": address }))
            .send()
            .await?;
        parse_enrichment_response(&success_body(res).await?)
    }
}

#[cfg(test)]
#[path = "tests/providers_tests.rs"]
mod tests;
