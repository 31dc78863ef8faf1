//! Network-wide option handling for multisite deployments
//!
//! Release metadata is shared by every site and always lives on the main
//! network, regardless of which network is current when it is accessed.
//! Older installs stored it on whatever network happened to be current;
//! [`try_upgrade`] moves such copies back to the main network.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::requirements::orchestrator::ProAvailability;
use crate::storage::{OptionScope, OptionStore, StorageError};
use crate::version::releases::ReleaseMetadata;

/// Option key holding per-site plugin settings
pub const OPTIONS_KEY: &str = "font-awesome";

/// Option key holding release metadata
pub const RELEASES_OPTIONS_KEY: &str = "font-awesome-releases";

/// Reads and writes release metadata on the main network
pub struct ReleaseStore<'a, S: OptionStore> {
    store: &'a S,
    main_network_id: u64,
}

impl<'a, S: OptionStore> ReleaseStore<'a, S> {
    pub fn new(store: &'a S, main_network_id: u64) -> Self {
        Self {
            store,
            main_network_id,
        }
    }

    fn scope(&self) -> OptionScope {
        OptionScope::Network(self.main_network_id)
    }

    pub fn load(&self) -> Result<Option<ReleaseMetadata>, StorageError> {
        self.store
            .get_option(self.scope(), RELEASES_OPTIONS_KEY)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    pub fn save(&self, metadata: &ReleaseMetadata) -> Result<(), StorageError> {
        let value = serde_json::to_value(metadata)?;
        self.store
            .update_option(self.scope(), RELEASES_OPTIONS_KEY, &value)
    }

    pub fn delete(&self) -> Result<bool, StorageError> {
        self.store.delete_option(self.scope(), RELEASES_OPTIONS_KEY)
    }
}

/// What [`try_upgrade`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// Metadata already on the main network and nowhere else
    AlreadyCurrent,
    /// Metadata moved from the given network to the main network
    Moved { from: OptionScope },
    /// Main network already had metadata; stray copies were removed
    RemovedStrays { removed: Vec<OptionScope> },
    /// No release metadata stored anywhere
    NothingStored,
}

/// Move release metadata stored on a non-main network to the main network.
///
/// Safe to run repeatedly. When several non-main networks hold a copy, the
/// lowest network id wins and the rest are deleted.
pub fn try_upgrade<S: OptionStore>(
    store: &S,
    main_network_id: u64,
) -> Result<UpgradeOutcome, StorageError> {
    let main = OptionScope::Network(main_network_id);
    let holders = store.scopes_with_option(RELEASES_OPTIONS_KEY)?;

    let strays: Vec<OptionScope> = holders
        .iter()
        .copied()
        .filter(|scope| matches!(scope, OptionScope::Network(_)) && *scope != main)
        .collect();
    let main_has_metadata = holders.contains(&main);

    let outcome = match (main_has_metadata, strays.first()) {
        (false, None) => {
            debug!("No release metadata stored, nothing to upgrade");
            return Ok(UpgradeOutcome::NothingStored);
        }
        (true, None) => return Ok(UpgradeOutcome::AlreadyCurrent),
        (true, Some(_)) => UpgradeOutcome::RemovedStrays {
            removed: strays.clone(),
        },
        (false, Some(&from)) => {
            let Some(value) = store.get_option(from, RELEASES_OPTIONS_KEY)? else {
                warn!("Release metadata vanished from {} during upgrade", from);
                return Ok(UpgradeOutcome::NothingStored);
            };
            store.update_option(main, RELEASES_OPTIONS_KEY, &value)?;
            info!("Moved release metadata from {} to {}", from, main);
            UpgradeOutcome::Moved { from }
        }
    };

    for stray in &strays {
        store.delete_option(*stray, RELEASES_OPTIONS_KEY)?;
        debug!("Removed release metadata from {}", stray);
    }

    Ok(outcome)
}

/// Per-site plugin settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub use_pro: bool,
}

impl Settings {
    pub fn load<S: OptionStore>(store: &S, site_id: u64) -> Result<Self, StorageError> {
        store
            .get_option(OptionScope::Site(site_id), OPTIONS_KEY)?
            .map(serde_json::from_value)
            .transpose()
            .map(Option::unwrap_or_default)
            .map_err(StorageError::from)
    }

    pub fn save<S: OptionStore>(&self, store: &S, site_id: u64) -> Result<(), StorageError> {
        let value = serde_json::to_value(self)?;
        store.update_option(OptionScope::Site(site_id), OPTIONS_KEY, &value)
    }
}

/// Pro availability read from the site's stored settings
pub struct SettingsProAvailability<'a, S: OptionStore> {
    store: &'a S,
    site_id: u64,
}

impl<'a, S: OptionStore> SettingsProAvailability<'a, S> {
    pub fn new(store: &'a S, site_id: u64) -> Self {
        Self { store, site_id }
    }
}

impl<S: OptionStore> ProAvailability for SettingsProAvailability<'_, S> {
    fn is_pro_available(&self) -> bool {
        match Settings::load(self.store, self.site_id) {
            Ok(settings) => settings.use_pro,
            Err(e) => {
                warn!("Failed to read settings for site {}: {}", self.site_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteOptionStore;
    use crate::storage::options::MockOptionStore;
    use chrono::Utc;
    use serde_json::json;

    fn metadata() -> ReleaseMetadata {
        ReleaseMetadata {
            refreshed_at: Utc::now(),
            latest: "5.1.0".to_string(),
            releases: vec!["5.1.0".to_string(), "5.0.13".to_string()],
        }
    }

    #[test]
    fn release_store_uses_main_network_scope() {
        let options = SqliteOptionStore::in_memory().unwrap();
        let store = ReleaseStore::new(&options, 4);

        let saved = metadata();
        store.save(&saved).unwrap();

        assert!(
            options
                .get_option(OptionScope::Network(4), RELEASES_OPTIONS_KEY)
                .unwrap()
                .is_some()
        );
        assert!(
            options
                .get_option(OptionScope::Network(1), RELEASES_OPTIONS_KEY)
                .unwrap()
                .is_none()
        );
        assert_eq!(store.load().unwrap(), Some(saved));
        assert!(store.delete().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn try_upgrade_moves_metadata_from_non_main_network() {
        let options = SqliteOptionStore::in_memory().unwrap();
        let value = serde_json::to_value(metadata()).unwrap();
        options
            .update_option(OptionScope::Network(2), RELEASES_OPTIONS_KEY, &value)
            .unwrap();

        let outcome = try_upgrade(&options, 1).unwrap();

        assert_eq!(
            outcome,
            UpgradeOutcome::Moved {
                from: OptionScope::Network(2)
            }
        );
        assert_eq!(
            options
                .get_option(OptionScope::Network(1), RELEASES_OPTIONS_KEY)
                .unwrap(),
            Some(value)
        );
        assert_eq!(
            options
                .get_option(OptionScope::Network(2), RELEASES_OPTIONS_KEY)
                .unwrap(),
            None
        );
    }

    #[test]
    fn try_upgrade_removes_strays_when_main_is_current() {
        let options = SqliteOptionStore::in_memory().unwrap();
        options
            .update_option(OptionScope::Network(1), RELEASES_OPTIONS_KEY, &json!({"a": 1}))
            .unwrap();
        options
            .update_option(OptionScope::Network(5), RELEASES_OPTIONS_KEY, &json!({"a": 2}))
            .unwrap();

        let outcome = try_upgrade(&options, 1).unwrap();

        assert_eq!(
            outcome,
            UpgradeOutcome::RemovedStrays {
                removed: vec![OptionScope::Network(5)]
            }
        );
        assert_eq!(
            options
                .get_option(OptionScope::Network(1), RELEASES_OPTIONS_KEY)
                .unwrap(),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn try_upgrade_is_idempotent() {
        let options = SqliteOptionStore::in_memory().unwrap();
        options
            .update_option(OptionScope::Network(3), RELEASES_OPTIONS_KEY, &json!({"a": 1}))
            .unwrap();

        try_upgrade(&options, 1).unwrap();

        assert_eq!(
            try_upgrade(&options, 1).unwrap(),
            UpgradeOutcome::AlreadyCurrent
        );
    }

    #[test]
    fn try_upgrade_with_nothing_stored() {
        let options = SqliteOptionStore::in_memory().unwrap();

        assert_eq!(
            try_upgrade(&options, 1).unwrap(),
            UpgradeOutcome::NothingStored
        );
    }

    #[test]
    fn try_upgrade_propagates_storage_errors() {
        let mut options = MockOptionStore::new();
        options
            .expect_scopes_with_option()
            .returning(|_| Err(StorageError::LockPoisoned));

        assert!(matches!(
            try_upgrade(&options, 1),
            Err(StorageError::LockPoisoned)
        ));
    }

    #[test]
    fn settings_default_when_missing() {
        let options = SqliteOptionStore::in_memory().unwrap();

        assert_eq!(Settings::load(&options, 1).unwrap(), Settings::default());
    }

    #[test]
    fn settings_pro_availability_reads_site_settings() {
        let options = SqliteOptionStore::in_memory().unwrap();
        Settings { use_pro: true }.save(&options, 2).unwrap();

        assert!(SettingsProAvailability::new(&options, 2).is_pro_available());
        assert!(!SettingsProAvailability::new(&options, 1).is_pro_available());
    }

    #[test]
    fn settings_pro_availability_is_false_on_storage_error() {
        let mut options = MockOptionStore::new();
        options
            .expect_get_option()
            .returning(|_, _| Err(StorageError::LockPoisoned));

        assert!(!SettingsProAvailability::new(&options, 1).is_pro_available());
    }
}
