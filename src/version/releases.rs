//! Release metadata fetched from the release API

use std::time::Duration;

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{DEFAULT_API_URL, FETCH_TIMEOUT_MS};
use crate::storage::OptionStore;
use crate::storage::multisite::ReleaseStore;
use crate::version::error::{RefreshError, ReleaseApiError};
use crate::version::semver::{find_semantic_max, sort_descending};

/// GraphQL query listing every release
const RELEASES_QUERY: &str = "query { releases { version } }";

/// Known releases, as persisted on the main network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReleaseMetadata {
    pub refreshed_at: DateTime<Utc>,
    /// Highest stable release
    pub latest: String,
    /// Every release, ordered from newest to oldest
    pub releases: Vec<String>,
}

impl ReleaseMetadata {
    /// Build metadata from an unordered list of release versions.
    ///
    /// Returns None when no entry is a valid version.
    pub fn from_versions(versions: &[String], refreshed_at: DateTime<Utc>) -> Option<Self> {
        let latest = find_semantic_max(versions)?;
        let releases = sort_descending(versions)
            .into_iter()
            .map(|v| v.to_string())
            .collect();

        Some(Self {
            refreshed_at,
            latest,
            releases,
        })
    }
}

/// Whether stored metadata is older than `refresh_interval_ms`
pub fn needs_refresh(
    metadata: Option<&ReleaseMetadata>,
    refresh_interval_ms: i64,
    now: DateTime<Utc>,
) -> bool {
    match metadata {
        None => true,
        Some(metadata) => (now - metadata.refreshed_at).num_milliseconds() >= refresh_interval_ms,
    }
}

/// Trait for fetching the list of available releases
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseFetcher: Send + Sync {
    /// Fetch every published release version, in no particular order
    async fn fetch_releases(&self) -> Result<Vec<String>, ReleaseApiError>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ReleasesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct ReleasesData {
    releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    version: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Release fetcher backed by the GraphQL release API
pub struct HttpReleaseFetcher {
    client: reqwest::Client,
    api_url: String,
}

impl HttpReleaseFetcher {
    /// Creates a new HttpReleaseFetcher with a custom API URL
    pub fn new(api_url: &str) -> Result<Self, ReleaseApiError> {
        let client = reqwest::Client::builder()
            .user_agent("fa-requirements")
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a fetcher for the public release API
    pub fn public() -> Result<Self, ReleaseApiError> {
        Self::new(DEFAULT_API_URL)
    }
}

#[async_trait::async_trait]
impl ReleaseFetcher for HttpReleaseFetcher {
    async fn fetch_releases(&self) -> Result<Vec<String>, ReleaseApiError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&GraphQlRequest {
                query: RELEASES_QUERY,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Release API returned status {}: {}", status, self.api_url);
            return Err(ReleaseApiError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body: GraphQlResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse release API response: {}", e);
            ReleaseApiError::InvalidResponse(e.to_string())
        })?;

        if let Some(error) = body.errors.first() {
            return Err(ReleaseApiError::InvalidResponse(error.message.clone()));
        }

        let data = body
            .data
            .ok_or_else(|| ReleaseApiError::InvalidResponse("missing data".to_string()))?;

        Ok(data.releases.into_iter().map(|r| r.version).collect())
    }
}

/// Fetch releases and persist them on the main network
pub async fn refresh_releases<S: OptionStore>(
    fetcher: &dyn ReleaseFetcher,
    store: &ReleaseStore<'_, S>,
) -> Result<ReleaseMetadata, RefreshError> {
    let versions = fetcher.fetch_releases().await?;

    let metadata = ReleaseMetadata::from_versions(&versions, Utc::now()).ok_or_else(|| {
        ReleaseApiError::InvalidResponse("no valid release versions".to_string())
    })?;

    store.save(&metadata)?;
    info!(
        "Saved {} releases, latest {}",
        metadata.releases.len(),
        metadata.latest
    );

    Ok(metadata)
}
