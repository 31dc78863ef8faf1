//! Shared test utilities

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tempfile::TempDir;

use fa_requirements::requirements::{
    ClientRequirement, ConflictReport, LoadSpec, ProAvailability, Resolver,
};
use fa_requirements::storage::SqliteOptionStore;
use fa_requirements::version::catalog::{ReleaseCatalog, StaticCatalog};

/// Outcomes observed by the listeners attached with [`record_outcomes`]
#[derive(Debug, Default)]
pub struct Recorded {
    pub resolved: Vec<LoadSpec>,
    pub failed: Vec<ConflictReport>,
}

pub fn record_outcomes<C: ReleaseCatalog, P: ProAvailability>(
    resolver: &mut Resolver<C, P>,
) -> Rc<RefCell<Recorded>> {
    let recorded = Rc::new(RefCell::new(Recorded::default()));

    let resolved = recorded.clone();
    resolver.on_resolved(move |spec| resolved.borrow_mut().resolved.push(spec.clone()));
    let failed = recorded.clone();
    resolver.on_failed(move |report| failed.borrow_mut().failed.push(report.clone()));

    recorded
}

/// Resolver whose catalog only knows the latest release
pub fn latest_only_resolver(latest: &str, pro: bool) -> Resolver<StaticCatalog, bool> {
    Resolver::new(StaticCatalog::latest_only(latest), pro)
}

/// Resolver over a full release catalog
pub fn catalog_resolver(versions: &[&str], pro: bool) -> Resolver<StaticCatalog, bool> {
    let versions = versions.iter().map(|v| v.to_string()).collect();
    Resolver::new(StaticCatalog::new(versions), pro)
}

/// Attach one collection listener registering `requirements` in order
pub fn declare<C: ReleaseCatalog, P: ProAvailability>(
    resolver: &mut Resolver<C, P>,
    requirements: Vec<ClientRequirement>,
) {
    resolver.on_requirements(move |registry| {
        for requirement in &requirements {
            registry.register(requirement.clone())?;
        }
        Ok(())
    });
}

/// Options database in a temporary directory
pub fn create_test_store() -> (TempDir, SqliteOptionStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteOptionStore::new(&temp_dir.path().join("options.db")).unwrap();
    (temp_dir, store)
}
