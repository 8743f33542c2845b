//! Configuration types.
//!
//! - `ConnectionConfig`: where and how to reach the server
//! - `AggregatorConfig`: how instance information is collected
//!
//! These structs never hold passwords; see [`crate::security::Credentials`].

mod aggregator;
mod connection;

pub use aggregator::{AggregatorConfig, EntityKeyMode};
pub use connection::{ConnectionConfig, DEFAULT_PORT};
