//! Core library for mongoinfo.
//!
//! Gathers administrative state from a running MongoDB server (build
//! information, per-database statistics, runtime parameters, users and
//! roles), normalizes it into a uniform [`InstanceInfo`] and returns the
//! subsets a caller asks for.
//!
//! # Architecture
//! - `version`: driver/server compatibility gate, run before collection
//! - `client`: the [`AdminCommandClient`] seam plus driver-backed and mock
//!   implementations
//! - `collectors`: one routine per subset, each translating command
//!   responses into normalized documents
//! - `aggregator`: two-phase orchestration of the collectors
//! - `filter`: inclusion/exclusion token grammar applied to the result
//! - `session`: gate, collect and filter in one call
//!
//! # Read-only guarantee
//! The only commands ever issued are `buildInfo`, `listDatabases`,
//! `getParameter`, `usersInfo`, `rolesInfo` and `ping`.

pub mod aggregator;
pub mod client;
pub mod collectors;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod security;
pub mod session;
pub mod version;


// Re-export commonly used types
pub use aggregator::InstanceInfoAggregator;
pub use client::{AdminCommandClient, MockCommandClient, MongoCommandClient};
pub use config::{AggregatorConfig, ConnectionConfig, EntityKeyMode};
pub use error::{MongoInfoError, Result};
pub use filter::{FilterToken, FilterWarning, FilteredInfo, SubsetFilter};
pub use logging::init_logging;
pub use models::{InstanceInfo, Subset};
pub use session::gather_instance_info;
pub use version::{CompatibilityPolicy, CompatibilityRule, DRIVER_VERSION, Version, VersionRange};
