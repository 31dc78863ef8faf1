use thiserror::Error;

use crate::version::error::{CatalogError, RangeError};

/// A client declaration that is malformed rather than merely incompatible
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Client requirement is missing a name")]
    MissingName,

    #[error("Client '{client}' declared an invalid version range: {source}")]
    InvalidVersionRange {
        client: String,
        #[source]
        source: RangeError,
    },
}

/// Failures that abort a resolution pass before any notification fires
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Release catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
