//! Requirement negotiation among independent clients
//!
//! A resolution pass runs synchronously:
//!
//! ```text
//! Idle ──load()──▶ Collecting ──merge ok──▶ Resolved  (on_resolved listeners)
//!                      │
//!                      ├──────conflict────▶ Failed    (on_failed listeners)
//!                      │
//!                      └──config error────▶ Idle      (error returned, no notification)
//! ```
//!
//! # Modules
//!
//! - [`types`]: Declarations, the resolved load specification and conflict reports
//! - [`registry`]: Ordered collection of declarations for one pass
//! - [`merger`]: Pure merge of declarations into a load specification
//! - [`notifier`]: Outcome listener lists
//! - [`orchestrator`]: The resolver driving a pass
//! - [`error`]: Configuration and resolution errors

pub mod error;
pub mod merger;
pub mod notifier;
pub mod orchestrator;
pub mod registry;
pub mod types;

pub use error::{ConfigurationError, ResolveError};
pub use merger::{merge, merge_with};
pub use orchestrator::{PassState, ProAvailability, Resolver};
pub use registry::ClientRegistry;
pub use types::{ClientRequirement, ConflictReport, LoadSpec, Method, Preference, RequirementKind};
