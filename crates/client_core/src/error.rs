use shared::{
    domain::{PlaceId, Region},
    error::ApiException,
};
use thiserror::Error;

/// Rejections raised before any local or remote state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("place id is required")]
    MissingId,
    #[error("place {0} is already in the list")]
    DuplicateId(PlaceId),
}

/// Any failed call against the persistence gateway.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("gateway transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway rejected request with status {status}: {source}")]
    Rejected {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("gateway returned a malformed payload: {0}")]
    Malformed(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("cannot move a place from region {from} into region {to}")]
    CrossRegion { from: Region, to: Region },
    #[error("index {index} is outside region {region} holding {len} places")]
    IndexOutOfRange {
        region: Region,
        index: usize,
        len: usize,
    },
}

/// Failures from third-party lookup services after their payloads were checked.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// `status` is absent when the provider reports the failure inside a 200 body.
    #[error("provider rejected request: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },
    #[error("provider returned a malformed payload: {0}")]
    Malformed(String),
    #[error("provider is not configured: {0}")]
    NotConfigured(&'static str),
}

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("a search query or link is required")]
    EmptyQuery,
    #[error("no place matched '{0}'")]
    NoMatch(String),
    #[error("place {0} is not in the list")]
    UnknownPlace(PlaceId),
    #[error("lookup failed: {0}")]
    Lookup(#[from] ProviderError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
