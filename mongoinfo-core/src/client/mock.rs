//! In-memory command client returning canned responses.

use super::{AdminCommandClient, command_name};
use crate::Result;
use crate::error::MongoInfoError;
use async_trait::async_trait;
use mongodb::bson::Document;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum CannedResponse {
    Reply(Document),
    Failure(String),
}

/// A command received by [`MockCommandClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCommand {
    /// Target database
    pub database: String,
    /// Full command document
    pub command: Document,
}

impl IssuedCommand {
    /// Name of the issued command.
    pub fn name(&self) -> &str {
        command_name(&self.command)
    }
}

/// Command client that answers from a table keyed by `(database, command)`.
///
/// Commands without a canned response fail, so a test notices any command
/// it did not expect.
///
/// # Example
/// ```rust
/// use mongoinfo_core::{AdminCommandClient, MockCommandClient};
/// use mongodb::bson::doc;
///
/// # tokio_test_block(async {
/// let client = MockCommandClient::new()
///     .with_response("admin", "buildInfo", doc! { "version": "7.0.5", "ok": 1.0 });
///
/// let reply = client.run_command("admin", doc! { "buildInfo": 1 }).await.unwrap();
/// assert_eq!(reply.get_str("version").unwrap(), "7.0.5");
/// assert_eq!(client.issued().len(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockCommandClient {
    responses: HashMap<(String, String), CannedResponse>,
    issued: Mutex<Vec<IssuedCommand>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockCommandClient {
    /// Creates a client with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reply for `command` on `database`.
    pub fn with_response(mut self, database: &str, command: &str, reply: Document) -> Self {
        self.responses.insert(
            (database.to_string(), command.to_string()),
            CannedResponse::Reply(reply),
        );
        self
    }

    /// Makes `command` on `database` fail with `message`.
    pub fn with_failure(mut self, database: &str, command: &str, message: &str) -> Self {
        self.responses.insert(
            (database.to_string(), command.to_string()),
            CannedResponse::Failure(message.to_string()),
        );
        self
    }

    /// Delays every reply, which lets tests observe concurrent calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Commands received so far, in arrival order.
    pub fn issued(&self) -> Vec<IssuedCommand> {
        self.issued
            .lock()
            .map(|issued| issued.clone())
            .unwrap_or_default()
    }

    /// Names of the commands received so far, in arrival order.
    pub fn issued_names(&self) -> Vec<String> {
        self.issued()
            .iter()
            .map(|command| command.name().to_string())
            .collect()
    }

    /// Highest number of commands that were in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, database: &str, command: &Document) {
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(IssuedCommand {
                database: database.to_string(),
                command: command.clone(),
            });
        }
    }
}

#[async_trait]
impl AdminCommandClient for MockCommandClient {
    async fn run_command(&self, database: &str, command: Document) -> Result<Document> {
        let name = command_name(&command).to_string();
        self.record(database, &command);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.responses.get(&(database.to_string(), name.clone())) {
            Some(CannedResponse::Reply(reply)) => Ok(reply.clone()),
            Some(CannedResponse::Failure(message)) => Err(MongoInfoError::command_failed(
                name,
                database,
                message.clone(),
            )),
            None => Err(MongoInfoError::command_failed(
                name,
                database,
                "no canned response registered",
            )),
        }
    }
}
