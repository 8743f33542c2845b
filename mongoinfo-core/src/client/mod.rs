//! Administrative command clients.
//!
//! Collectors only ever talk to the server through [`AdminCommandClient`],
//! which keeps connection setup, authentication and TLS outside the
//! collection logic.
//!
//! # Module Structure
//! - `mongo`: [`MongoCommandClient`], backed by the official driver
//! - `mock`: [`MockCommandClient`], canned responses for tests and dry runs

mod mock;
mod mongo;

use crate::Result;
use async_trait::async_trait;
use mongodb::bson::Document;

pub use mock::{IssuedCommand, MockCommandClient};
pub use mongo::MongoCommandClient;

/// Executes administrative commands against a server.
///
/// # Object Safety
/// The trait is object-safe; collectors accept `&dyn AdminCommandClient`.
#[async_trait]
pub trait AdminCommandClient: Send + Sync {
    /// Runs `command` against `database` and returns the response body.
    ///
    /// # Errors
    /// Returns [`crate::MongoInfoError::Command`] if the transport fails or
    /// the server reports a command error.
    async fn run_command(&self, database: &str, command: Document) -> Result<Document>;
}

/// Name of a command document, i.e. its first key.
pub fn command_name(command: &Document) -> &str {
    command.keys().next().map_or("<empty>", String::as_str)
}
