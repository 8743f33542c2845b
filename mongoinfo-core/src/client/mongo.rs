//! Command client backed by the official MongoDB driver.
//!
//! Handles client creation, connection string validation and connection
//! testing. Connection strings are redacted in every error and log line.

use super::{AdminCommandClient, command_name};
use crate::Result;
use crate::config::{ConnectionConfig, DEFAULT_PORT};
use crate::error::{MongoInfoError, redact_database_url};
use crate::security::Credentials;
use async_trait::async_trait;
use mongodb::Client;
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use std::time::Duration;
use url::Url;

/// Upper bound accepted for timeout query parameters.
const MAX_TIMEOUT_MS: u64 = 300_000;

/// [`AdminCommandClient`] over a `mongodb::Client`.
///
/// # Example
/// ```rust,no_run
/// use mongoinfo_core::MongoCommandClient;
///
/// # async fn run() -> mongoinfo_core::Result<()> {
/// let client = MongoCommandClient::new("mongodb://localhost:27017").await?;
/// client.test_connection().await?;
/// # Ok(())
/// # }
/// ```
pub struct MongoCommandClient {
    client: Client,
    config: ConnectionConfig,
}

impl std::fmt::Debug for MongoCommandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoCommandClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AdminCommandClient for MongoCommandClient {
    async fn run_command(&self, database: &str, command: Document) -> Result<Document> {
        let name = command_name(&command).to_string();
        tracing::trace!("Running '{}' on database '{}'", name, database);

        self.client
            .database(database)
            .run_command(command)
            .await
            .map_err(|e| MongoInfoError::command_failed(name, database, e))
    }
}

impl MongoCommandClient {
    /// Creates a client from a connection string.
    ///
    /// Credentials embedded in the URL are used as-is.
    ///
    /// # Errors
    /// Returns error if the connection string is invalid or the driver
    /// rejects the resulting options
    pub async fn new(connection_string: &str) -> Result<Self> {
        Self::connect(connection_string, None).await
    }

    /// Creates a client using explicit credentials instead of URL ones.
    ///
    /// # Errors
    /// Same as [`MongoCommandClient::new`]
    pub async fn with_credentials(
        connection_string: &str,
        credentials: &Credentials,
    ) -> Result<Self> {
        Self::connect(connection_string, Some(credentials)).await
    }

    async fn connect(connection_string: &str, credentials: Option<&Credentials>) -> Result<Self> {
        let mut config = Self::parse_connection_config(connection_string)?;
        if let Some(credentials) = credentials {
            config.username = Some(credentials.username().to_string());
            if let Some(source) = &credentials.source {
                config.auth_source = Some(source.clone());
            }
        }

        let mut options = Self::create_client_options(connection_string, &config).await?;
        if let Some(credentials) = credentials {
            options.credential = Some(credentials.to_driver_credential());
        }

        let client = Client::with_options(options).map_err(|e| {
            MongoInfoError::connection_failed(
                format!(
                    "Failed to create MongoDB client for {}",
                    redact_database_url(connection_string)
                ),
                e,
            )
        })?;

        tracing::debug!("Created MongoDB client for {}", config);

        Ok(Self { client, config })
    }

    /// Parses a connection string into a [`ConnectionConfig`].
    ///
    /// Only the first host of a replica set seed list is recorded.
    ///
    /// # Errors
    /// Returns error if the connection string is malformed or unsafe
    pub fn parse_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
        Self::validate_connection_string(connection_string)?;
        let url = parse_first_host(connection_string)?;

        let mut config = ConnectionConfig::new(url.host_str().unwrap_or("localhost").to_string());

        match url.port() {
            Some(0) => {
                return Err(MongoInfoError::configuration(
                    "Invalid port number: must be greater than 0",
                ));
            }
            Some(port) => config = config.with_port(port),
            None if url.scheme() == "mongodb" => config = config.with_port(DEFAULT_PORT),
            None => {}
        }

        let path = url.path().trim_start_matches('/');
        if !path.is_empty() {
            config = config.with_database(path.to_string());
        }

        let username = url.username();
        if !username.is_empty() {
            config = config.with_username(username.to_string());
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "authSource" if !value.is_empty() => {
                    config.auth_source = Some(value.to_string());
                }
                "connectTimeoutMS" => {
                    config.connect_timeout = parse_timeout_ms(&key, &value)?;
                }
                "serverSelectionTimeoutMS" => {
                    config.server_selection_timeout = parse_timeout_ms(&key, &value)?;
                }
                "maxPoolSize" => {
                    config.max_pool_size = parse_pool_size(&key, &value)?;
                }
                "minPoolSize" => {
                    config.min_pool_size = parse_pool_size(&key, &value)?;
                }
                _ => {}
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Validates a MongoDB connection string.
    ///
    /// # Errors
    /// Returns error if the scheme is not `mongodb://`/`mongodb+srv://` or
    /// no host is present
    pub fn validate_connection_string(connection_string: &str) -> Result<()> {
        let url = parse_first_host(connection_string)?;

        if !matches!(url.scheme(), "mongodb" | "mongodb+srv") {
            return Err(MongoInfoError::configuration(
                "Connection string must use mongodb:// or mongodb+srv:// scheme",
            ));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(MongoInfoError::configuration(
                "Connection string must specify a host",
            ));
        }

        Ok(())
    }

    async fn create_client_options(
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<ClientOptions> {
        let mut options = ClientOptions::parse(connection_string).await.map_err(|e| {
            MongoInfoError::configuration(format!(
                "Failed to parse MongoDB connection options: {}",
                e
            ))
        })?;

        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.app_name = Some(format!("mongoinfo-{}", env!("CARGO_PKG_VERSION")));

        Ok(options)
    }

    /// Tests the connection with a `ping` against `admin`.
    ///
    /// # Errors
    /// Returns [`MongoInfoError::Connection`] if the server is unreachable
    /// or rejects the command
    pub async fn test_connection(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| MongoInfoError::connection_failed(format!("Ping to {} failed", self.config), e))?;
        Ok(())
    }

    /// Connection configuration (credentials excluded).
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Parses the connection string with any seed list reduced to its first host.
fn parse_first_host(connection_string: &str) -> Result<Url> {
    let reduced = match connection_string.split_once("://") {
        Some((scheme, rest)) => {
            let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
            let (authority, tail) = rest.split_at(authority_end);
            match authority.split_once(',') {
                Some((first, _)) => format!("{}://{}{}", scheme, first, tail),
                None => connection_string.to_string(),
            }
        }
        None => connection_string.to_string(),
    };

    Url::parse(&reduced).map_err(|e| {
        MongoInfoError::configuration(format!(
            "Invalid MongoDB connection string format: {}",
            e
        ))
    })
}

fn parse_timeout_ms(key: &str, value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0 && *ms <= MAX_TIMEOUT_MS)
        .map(Duration::from_millis)
        .ok_or_else(|| {
            MongoInfoError::configuration(format!(
                "{} must be between 1 and {} milliseconds",
                key, MAX_TIMEOUT_MS
            ))
        })
}

fn parse_pool_size(key: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        MongoInfoError::configuration(format!("{} must be a non-negative integer", key))
    })
}
