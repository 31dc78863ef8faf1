//! Collection of client declarations for one resolution pass

use tracing::{debug, warn};

use crate::requirements::error::ConfigurationError;
use crate::requirements::types::ClientRequirement;
use crate::version::range::VersionConstraint;

/// Ordered declarations submitted during a single pass.
///
/// The first configuration error is remembered so the pass aborts even when
/// the registering client ignores the returned error.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    requirements: Vec<ClientRequirement>,
    error: Option<ConfigurationError>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration, validating its name and version range
    pub fn register(&mut self, requirement: ClientRequirement) -> Result<(), ConfigurationError> {
        if let Err(e) = validate(&requirement) {
            warn!("Rejected client requirement: {}", e);
            if self.error.is_none() {
                self.error = Some(e.clone());
            }
            return Err(e);
        }

        debug!("Registered requirements for client '{}'", requirement.name);
        self.requirements.push(requirement);
        Ok(())
    }

    /// Declarations in registration order
    pub fn requirements(&self) -> &[ClientRequirement] {
        &self.requirements
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Drop every declaration and any recorded error
    pub fn reset(&mut self) {
        self.requirements.clear();
        self.error = None;
    }

    /// Consume the registry, failing if any registration was rejected
    pub fn into_requirements(self) -> Result<Vec<ClientRequirement>, ConfigurationError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.requirements),
        }
    }
}

fn validate(requirement: &ClientRequirement) -> Result<(), ConfigurationError> {
    if requirement.name.trim().is_empty() {
        return Err(ConfigurationError::MissingName);
    }

    if let Some(range) = &requirement.version {
        VersionConstraint::parse(range).map_err(|source| {
            ConfigurationError::InvalidVersionRange {
                client: requirement.name.clone(),
                source,
            }
        })?;
    }

    Ok(())
}
