//! Drives one resolution pass end to end

#[cfg(test)]
use mockall::automock;
use semver::Version;
use tracing::{debug, error, info, warn};

use crate::requirements::error::{ConfigurationError, ResolveError};
use crate::requirements::merger::merge_with;
use crate::requirements::notifier::{Notifier, Outcome};
use crate::requirements::registry::ClientRegistry;
use crate::requirements::types::{ClientRequirement, ConflictReport, LoadSpec};
use crate::version::catalog::ReleaseCatalog;
use crate::version::error::CatalogError;
use crate::version::semver::{parse_version, sort_descending};

/// Whether the Pro feature set can be served
#[cfg_attr(test, automock)]
pub trait ProAvailability {
    fn is_pro_available(&self) -> bool;
}

impl ProAvailability for bool {
    fn is_pro_available(&self) -> bool {
        *self
    }
}

/// Where the resolver is in its current pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Collecting,
    Resolved,
    Failed,
}

type Collector = Box<dyn FnMut(&mut ClientRegistry) -> Result<(), ConfigurationError>>;

/// Collects client requirements, merges them and reports the outcome.
///
/// Collaborators are injected: `catalog` supplies release versions and
/// `pro` answers whether Pro is available.
pub struct Resolver<C: ReleaseCatalog, P: ProAvailability> {
    catalog: C,
    pro: P,
    collectors: Vec<Collector>,
    notifier: Notifier,
    pending: ClientRegistry,
    state: PassState,
}

impl<C: ReleaseCatalog, P: ProAvailability> Resolver<C, P> {
    pub fn new(catalog: C, pro: P) -> Self {
        Self {
            catalog,
            pro,
            collectors: Vec::new(),
            notifier: Notifier::new(),
            pending: ClientRegistry::new(),
            state: PassState::Idle,
        }
    }

    /// Add a collection-phase listener.
    ///
    /// Listeners are invoked in the order they were added at the start of
    /// every pass and register client requirements on the supplied registry.
    pub fn on_requirements(
        &mut self,
        collector: impl FnMut(&mut ClientRegistry) -> Result<(), ConfigurationError> + 'static,
    ) {
        self.collectors.push(Box::new(collector));
    }

    pub fn on_resolved(&mut self, listener: impl FnMut(&LoadSpec) + 'static) {
        self.notifier.on_resolved(listener);
    }

    pub fn on_failed(&mut self, listener: impl FnMut(&ConflictReport) + 'static) {
        self.notifier.on_failed(listener);
    }

    /// Register a requirement ahead of the next pass
    pub fn register(&mut self, requirement: ClientRequirement) -> Result<(), ConfigurationError> {
        self.pending.register(requirement)
    }

    /// Drop pending registrations and return to [`PassState::Idle`].
    /// Listeners stay attached.
    pub fn reset(&mut self) {
        self.pending.reset();
        self.state = PassState::Idle;
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Run one resolution pass.
    ///
    /// Returns `Ok(Some(spec))` when clients agree and `Ok(None)` when they
    /// conflict; exactly one outcome notification fires in both cases.
    /// Configuration and catalog errors abort the pass with no notification.
    pub fn load(&mut self) -> Result<Option<LoadSpec>, ResolveError> {
        let mut registry = std::mem::take(&mut self.pending);
        self.state = PassState::Collecting;
        debug!("Collecting client requirements");

        let result = self.collect_and_merge(&mut registry);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Resolution pass aborted: {}", e);
                self.state = PassState::Idle;
                return Err(e);
            }
        };

        self.notifier.emit(&outcome);

        match outcome {
            Outcome::Resolved(spec) => {
                info!(
                    "Resolved {} {} (v4shim: {}, pseudo-elements: {}, pro: {})",
                    spec.method, spec.version, spec.v4shim, spec.pseudo_elements, spec.pro
                );
                self.state = PassState::Resolved;
                Ok(Some(spec))
            }
            Outcome::Failed(report) => {
                warn!("{}", report);
                self.state = PassState::Failed;
                Ok(None)
            }
        }
    }

    fn collect_and_merge(&mut self, registry: &mut ClientRegistry) -> Result<Outcome, ResolveError> {
        for collector in &mut self.collectors {
            collector(&mut *registry)?;
        }

        let requirements = std::mem::take(registry).into_requirements()?;
        debug!("Collected {} client requirements", requirements.len());

        let pro_available = self.pro.is_pro_available();

        Ok(
            match merge_with(&requirements, || self.candidates(), pro_available)? {
                Ok(spec) => Outcome::Resolved(spec),
                Err(report) => Outcome::Failed(report),
            },
        )
    }

    /// Stable catalog versions from newest to oldest, or the latest version
    /// alone when the catalog lists no stable release
    fn candidates(&self) -> Result<Vec<Version>, ResolveError> {
        let available: Vec<Version> = sort_descending(&self.catalog.available_versions()?)
            .into_iter()
            .filter(|version| version.pre.is_empty())
            .collect();
        if !available.is_empty() {
            return Ok(available);
        }

        let latest = self.catalog.latest_version()?;
        debug!("Release catalog is empty, using latest version {}", latest);

        parse_version(&latest)
            .map(|version| vec![version])
            .ok_or_else(|| CatalogError::InvalidVersion(latest).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::types::{Method, Preference, RequirementKind};
    use crate::version::catalog::{MockReleaseCatalog, StaticCatalog};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Seen {
        resolved: Vec<LoadSpec>,
        failed: Vec<ConflictReport>,
    }

    fn watch<C: ReleaseCatalog, P: ProAvailability>(resolver: &mut Resolver<C, P>) -> Rc<RefCell<Seen>> {
        let seen = Rc::new(RefCell::new(Seen::default()));
        let resolved = seen.clone();
        resolver.on_resolved(move |spec| resolved.borrow_mut().resolved.push(spec.clone()));
        let failed = seen.clone();
        resolver.on_failed(move |report| failed.borrow_mut().failed.push(report.clone()));
        seen
    }

    #[test]
    fn load_resolves_and_notifies_once() {
        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), false);
        let seen = watch(&mut resolver);
        resolver.on_requirements(|registry| registry.register(ClientRequirement::new("test")));

        let spec = resolver.load().unwrap().unwrap();

        assert_eq!(spec.version, "5.0.13");
        assert_eq!(seen.borrow().resolved, vec![spec]);
        assert!(seen.borrow().failed.is_empty());
        assert_eq!(resolver.state(), PassState::Resolved);
    }

    #[test]
    fn load_reports_conflicts_through_failed_notification() {
        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), false);
        let seen = watch(&mut resolver);
        resolver.on_requirements(|registry| {
            registry.register(ClientRequirement::new("clientA").with_method(Method::Svg))?;
            registry.register(ClientRequirement::new("clientB").with_method(Method::Webfont))
        });

        assert_eq!(resolver.load().unwrap(), None);

        let seen = seen.borrow();
        assert!(seen.resolved.is_empty());
        assert_eq!(seen.failed.len(), 1);
        assert_eq!(seen.failed[0].requirement_kind, RequirementKind::Method);
        assert_eq!(resolver.state(), PassState::Failed);
    }

    #[test]
    fn configuration_error_aborts_without_notifications() {
        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), false);
        let seen = watch(&mut resolver);
        resolver.on_requirements(|registry| {
            // error deliberately ignored by the client
            let _ = registry.register(ClientRequirement::new(""));
            Ok(())
        });

        let result = resolver.load();

        assert!(matches!(
            result,
            Err(ResolveError::Configuration(ConfigurationError::MissingName))
        ));
        assert!(seen.borrow().resolved.is_empty());
        assert!(seen.borrow().failed.is_empty());
        assert_eq!(resolver.state(), PassState::Idle);
    }

    #[test]
    fn catalog_is_preferred_over_latest() {
        let mut catalog = MockReleaseCatalog::new();
        catalog
            .expect_available_versions()
            .times(1)
            .returning(|| Ok(vec!["5.0.12".to_string(), "5.1.0".to_string(), "5.0.13".to_string()]));
        catalog.expect_latest_version().never();

        let mut resolver = Resolver::new(catalog, false);
        resolver
            .register(ClientRequirement::new("a").with_version("~5.0.0"))
            .unwrap();

        assert_eq!(resolver.load().unwrap().unwrap().version, "5.0.13");
    }

    #[test]
    fn empty_catalog_falls_back_to_latest() {
        let mut catalog = MockReleaseCatalog::new();
        catalog.expect_available_versions().returning(|| Ok(vec![]));
        catalog
            .expect_latest_version()
            .times(1)
            .returning(|| Ok("5.0.13".to_string()));

        let mut resolver = Resolver::new(catalog, false);

        assert_eq!(resolver.load().unwrap().unwrap().version, "5.0.13");
    }

    #[test]
    fn catalog_errors_abort_the_pass() {
        let mut catalog = MockReleaseCatalog::new();
        catalog.expect_available_versions().returning(|| Ok(vec![]));
        catalog
            .expect_latest_version()
            .returning(|| Err(CatalogError::NoReleaseMetadata));

        let mut resolver = Resolver::new(catalog, false);
        let seen = watch(&mut resolver);

        assert!(matches!(
            resolver.load(),
            Err(ResolveError::Catalog(CatalogError::NoReleaseMetadata))
        ));
        assert!(seen.borrow().resolved.is_empty());
        assert!(seen.borrow().failed.is_empty());
    }

    #[test]
    fn pre_releases_are_not_candidates() {
        let catalog = StaticCatalog::new(vec![
            "5.0.13".to_string(),
            "5.1.0".to_string(),
            "6.0.0-beta1".to_string(),
        ]);
        let mut resolver = Resolver::new(catalog, false);
        resolver.on_requirements(|registry| {
            registry.register(ClientRequirement::new("any"))?;
            registry.register(ClientRequirement::new("floor").with_version(">=5.0.12"))
        });

        assert_eq!(resolver.load().unwrap().unwrap().version, "5.1.0");
    }

    #[test]
    fn pre_release_only_catalog_falls_back_to_latest() {
        let catalog = StaticCatalog::new(vec!["6.0.0-beta1".to_string()]).with_latest("5.1.0");
        let mut resolver = Resolver::new(catalog, false);

        assert_eq!(resolver.load().unwrap().unwrap().version, "5.1.0");
    }

    #[test]
    fn method_conflict_is_reported_without_a_catalog() {
        let mut resolver = Resolver::new(StaticCatalog::default(), false);
        let seen = watch(&mut resolver);
        resolver.on_requirements(|registry| {
            registry.register(ClientRequirement::new("a").with_method(Method::Svg))?;
            registry.register(ClientRequirement::new("b").with_method(Method::Webfont))
        });

        assert_eq!(resolver.load().unwrap(), None);

        let seen = seen.borrow();
        assert!(seen.resolved.is_empty());
        assert_eq!(seen.failed.len(), 1);
        assert_eq!(seen.failed[0].requirement_kind, RequirementKind::Method);
        assert_eq!(resolver.state(), PassState::Failed);
    }

    #[test]
    fn catalog_is_not_queried_on_early_conflict() {
        let mut catalog = MockReleaseCatalog::new();
        catalog.expect_available_versions().never();
        catalog.expect_latest_version().never();

        let mut resolver = Resolver::new(catalog, false);
        resolver
            .register(ClientRequirement::new("a").with_v4shim(Preference::Require))
            .unwrap();
        resolver
            .register(ClientRequirement::new("b").with_v4shim(Preference::Forbid))
            .unwrap();

        assert_eq!(resolver.load().unwrap(), None);
    }

    #[test]
    fn pro_availability_is_queried_once_per_pass() {
        let mut pro = MockProAvailability::new();
        pro.expect_is_pro_available().times(1).return_const(true);

        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), pro);
        resolver.on_requirements(|registry| {
            registry.register(ClientRequirement::new("test").with_pro(true))
        });

        assert!(resolver.load().unwrap().unwrap().pro);
    }

    #[test]
    fn registrations_do_not_leak_into_the_next_pass() {
        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), false);
        resolver
            .register(ClientRequirement::new("a").with_method(Method::Svg))
            .unwrap();
        assert_eq!(resolver.load().unwrap().unwrap().method, Method::Svg);

        resolver
            .register(ClientRequirement::new("b").with_method(Method::Webfont))
            .unwrap();
        assert_eq!(resolver.load().unwrap().unwrap().method, Method::Webfont);
    }

    #[test]
    fn reset_clears_pending_registrations() {
        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), false);
        let _ = resolver.register(ClientRequirement::new(""));

        resolver.reset();

        assert_eq!(resolver.state(), PassState::Idle);
        assert!(resolver.load().unwrap().is_some());
    }

    #[test]
    fn collectors_run_in_order_every_pass() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut resolver = Resolver::new(StaticCatalog::latest_only("5.0.13"), false);

        let first = order.clone();
        resolver.on_requirements(move |_| {
            first.borrow_mut().push("first");
            Ok(())
        });
        let second = order.clone();
        resolver.on_requirements(move |_| {
            second.borrow_mut().push("second");
            Ok(())
        });

        resolver.load().unwrap();
        resolver.load().unwrap();

        assert_eq!(*order.borrow(), vec!["first", "second", "first", "second"]);
    }
}
