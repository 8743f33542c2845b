//! Subset collectors.
//!
//! Each collector issues one read-only administrative command through an
//! [`crate::AdminCommandClient`] and turns the response into a normalized
//! document. Failures are reported as [`crate::MongoInfoError::Collection`]
//! tagged with the subset that failed.
//!
//! # Module Structure
//! - `server`: `general` (`buildInfo`) and `parameters` (`getParameter`)
//! - `databases`: `databases` and `total_size` (`listDatabases`)
//! - `accounts`: per-database `users` (`usersInfo`) and `roles` (`rolesInfo`)
//! - `normalize`: size and UUID normalization

mod accounts;
mod databases;
mod normalize;
mod server;

pub use accounts::{collect_roles, collect_users};
pub use databases::{DatabaseListing, collect_databases};
pub use normalize::{SizeError, convert_uuid_fields, normalize_size, uuid_to_hex};
pub use server::{collect_general, collect_parameters};
