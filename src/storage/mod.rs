//! Persisted options
//!
//! Options are JSON values stored under a fixed key, scoped either to a
//! single site or to a whole network of sites.
//!
//! # Modules
//!
//! - [`options`]: `OptionStore` trait and its SQLite implementation
//! - [`multisite`]: main-network release metadata, upgrade migration and settings

pub mod multisite;
pub mod options;

use std::fmt;

use thiserror::Error;

pub use options::{OptionStore, SqliteOptionStore};

/// Where an option lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionScope {
    Site(u64),
    Network(u64),
}

impl OptionScope {
    pub fn kind(&self) -> &'static str {
        match self {
            OptionScope::Site(_) => "site",
            OptionScope::Network(_) => "network",
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            OptionScope::Site(id) | OptionScope::Network(id) => *id,
        }
    }

    pub(crate) fn from_parts(kind: &str, id: u64) -> Option<Self> {
        match kind {
            "site" => Some(OptionScope::Site(id)),
            "network" => Some(OptionScope::Network(id)),
            _ => None,
        }
    }
}

impl fmt::Display for OptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}
