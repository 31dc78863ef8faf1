//! Release catalog consulted when resolving a version

#[cfg(test)]
use mockall::automock;

use crate::storage::OptionStore;
use crate::storage::multisite::ReleaseStore;
use crate::version::error::CatalogError;
use crate::version::semver::find_semantic_max;

/// Source of available releases
#[cfg_attr(test, automock)]
pub trait ReleaseCatalog {
    /// All available versions, ordered from newest to oldest. May be empty.
    fn available_versions(&self) -> Result<Vec<String>, CatalogError>;

    /// The version to load when no catalog is consulted
    fn latest_version(&self) -> Result<String, CatalogError>;
}

/// Fixed, in-memory catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCatalog {
    versions: Vec<String>,
    latest: Option<String>,
}

impl StaticCatalog {
    /// Catalog listing `versions`; latest is their semantic max
    pub fn new(versions: Vec<String>) -> Self {
        Self {
            versions,
            latest: None,
        }
    }

    /// Catalog with no version list, only a latest version
    pub fn latest_only(latest: &str) -> Self {
        Self {
            versions: Vec::new(),
            latest: Some(latest.to_string()),
        }
    }

    /// Override the reported latest version
    pub fn with_latest(mut self, latest: &str) -> Self {
        self.latest = Some(latest.to_string());
        self
    }
}

impl ReleaseCatalog for StaticCatalog {
    fn available_versions(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.versions.clone())
    }

    fn latest_version(&self) -> Result<String, CatalogError> {
        self.latest
            .clone()
            .or_else(|| find_semantic_max(&self.versions))
            .ok_or(CatalogError::NoReleaseMetadata)
    }
}

/// Catalog backed by release metadata persisted on the main network
pub struct StoredCatalog<'a, S: OptionStore> {
    releases: ReleaseStore<'a, S>,
}

impl<'a, S: OptionStore> StoredCatalog<'a, S> {
    pub fn new(store: &'a S, main_network_id: u64) -> Self {
        Self {
            releases: ReleaseStore::new(store, main_network_id),
        }
    }
}

impl<S: OptionStore> ReleaseCatalog for StoredCatalog<'_, S> {
    fn available_versions(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .releases
            .load()?
            .map(|metadata| metadata.releases)
            .unwrap_or_default())
    }

    fn latest_version(&self) -> Result<String, CatalogError> {
        self.releases
            .load()?
            .map(|metadata| metadata.latest)
            .ok_or(CatalogError::NoReleaseMetadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteOptionStore;
    use crate::version::releases::ReleaseMetadata;
    use chrono::Utc;

    fn strings(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn static_catalog_latest_defaults_to_semantic_max() {
        let catalog = StaticCatalog::new(strings(&["5.0.12", "5.1.0", "5.0.13"]));

        assert_eq!(catalog.latest_version().unwrap(), "5.1.0");
    }

    #[test]
    fn static_catalog_latest_only_has_no_versions() {
        let catalog = StaticCatalog::latest_only("5.0.13");

        assert!(catalog.available_versions().unwrap().is_empty());
        assert_eq!(catalog.latest_version().unwrap(), "5.0.13");
    }

    #[test]
    fn empty_static_catalog_has_no_latest() {
        assert!(matches!(
            StaticCatalog::default().latest_version(),
            Err(CatalogError::NoReleaseMetadata)
        ));
    }

    #[test]
    fn stored_catalog_reads_main_network_metadata() {
        let options = SqliteOptionStore::in_memory().unwrap();
        ReleaseStore::new(&options, 1)
            .save(&ReleaseMetadata {
                refreshed_at: Utc::now(),
                latest: "5.1.0".to_string(),
                releases: strings(&["5.1.0", "5.0.13"]),
            })
            .unwrap();

        let catalog = StoredCatalog::new(&options, 1);

        assert_eq!(
            catalog.available_versions().unwrap(),
            strings(&["5.1.0", "5.0.13"])
        );
        assert_eq!(catalog.latest_version().unwrap(), "5.1.0");
    }

    #[test]
    fn stored_catalog_without_metadata() {
        let options = SqliteOptionStore::in_memory().unwrap();
        let catalog = StoredCatalog::new(&options, 1);

        assert!(catalog.available_versions().unwrap().is_empty());
        assert!(matches!(
            catalog.latest_version(),
            Err(CatalogError::NoReleaseMetadata)
        ));
    }
}
