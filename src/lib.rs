//! Requirement negotiation for loading the Font Awesome icon library
//!
//! Independent clients (plugins, themes) declare how they need the icon
//! library to be loaded. This crate merges those declarations into a single
//! load specification, reports irreconcilable conflicts, and picks a release
//! that satisfies every client's version range.
//!
//! # Modules
//!
//! - [`requirements`]: client registry, merger, notifications and the resolution pass
//! - [`version`]: semver range evaluation and the release catalog
//! - [`storage`]: persisted options, including the multisite main-network store
//! - [`assets`]: the styles and scripts a resolved load specification maps to
//! - [`config`]: runtime configuration and data paths
//! - [`logging`]: tracing subscriber setup

pub mod assets;
pub mod config;
pub mod logging;
pub mod requirements;
pub mod storage;
pub mod version;
