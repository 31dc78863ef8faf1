use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid version range: {0:?}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No release metadata available")]
    NoReleaseMetadata,

    #[error("Invalid release version: {0}")]
    InvalidVersion(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ReleaseApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Api(#[from] ReleaseApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
