//! Version layer for release selection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Releases   │────▶│   Storage   │◀────│   Catalog   │
//! │  (fetch)    │     │ (main net)  │     │  (query)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │    Range    │
//!                                         │ (satisfies) │
//!                                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: `ReleaseCatalog` trait and its static and stored implementations
//! - [`error`]: Error types for ranges, catalogs and the release API
//! - [`range`]: Composer-style range parsing, satisfaction and best-version selection
//! - [`releases`]: Release metadata, the HTTP fetcher and refresh logic
//! - [`semver`]: Shared version parsing and ordering utilities

pub mod catalog;
pub mod error;
pub mod range;
pub mod releases;
pub mod semver;
