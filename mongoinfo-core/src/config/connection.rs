//! MongoDB connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default MongoDB port.
pub const DEFAULT_PORT: u16 = 27017;

/// Configuration for the MongoDB connection.
///
/// This struct intentionally does NOT store passwords or credentials.
///
/// # Example
/// ```rust
/// use mongoinfo_core::ConnectionConfig;
///
/// let config = ConnectionConfig::new("localhost".to_string())
///     .with_port(27017)
///     .with_auth_source("admin".to_string())
///     .with_username("admin".to_string());
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server host address
    pub host: String,
    /// Optional port number
    pub port: Option<u16>,
    /// Default database from the connection string path
    pub database: Option<String>,
    /// Optional username (password handled separately)
    pub username: Option<String>,
    /// Database the credentials are defined in
    pub auth_source: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Server selection timeout duration
    pub server_selection_timeout: Duration,
    /// Maximum number of pooled connections
    pub max_pool_size: u32,
    /// Minimum number of idle pooled connections
    pub min_pool_size: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            auth_source: None,
            connect_timeout: Duration::from_secs(30),
            server_selection_timeout: Duration::from_secs(30),
            max_pool_size: 10,
            min_pool_size: 0,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig({}{}{})",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{}", p)),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Username omitted on purpose
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid or unsafe
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.is_empty() {
            return Err(crate::error::MongoInfoError::configuration(
                "host cannot be empty",
            ));
        }

        if self.port == Some(0) {
            return Err(crate::error::MongoInfoError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.max_pool_size == 0 {
            return Err(crate::error::MongoInfoError::configuration(
                "max_pool_size must be greater than 0",
            ));
        }

        if self.max_pool_size > 100 {
            return Err(crate::error::MongoInfoError::configuration(
                "max_pool_size should not exceed 100",
            ));
        }

        if self.min_pool_size > self.max_pool_size {
            return Err(crate::error::MongoInfoError::configuration(
                "min_pool_size cannot exceed max_pool_size",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::MongoInfoError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.server_selection_timeout.is_zero() {
            return Err(crate::error::MongoInfoError::configuration(
                "server_selection_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Creates a new connection config with safe defaults.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set the default database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Builder method to set the authentication database.
    pub fn with_auth_source(mut self, auth_source: String) -> Self {
        self.auth_source = Some(auth_source);
        self
    }

    /// Authentication database, falling back to `admin`.
    pub fn effective_auth_source(&self) -> &str {
        self.auth_source.as_deref().unwrap_or("admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, None);
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.effective_auth_source(), "admin");
    }

    #[test]
    fn test_connection_config_validation() {
        assert!(ConnectionConfig::new("localhost".to_string()).validate().is_ok());

        let config = ConnectionConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            port: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            max_pool_size: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            max_pool_size: 4,
            min_pool_size: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            server_selection_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::new("mongo.example.com".to_string())
            .with_port(27018)
            .with_database("inventory".to_string())
            .with_username("auditor".to_string())
            .with_auth_source("$external".to_string());

        assert_eq!(config.host, "mongo.example.com");
        assert_eq!(config.port, Some(27018));
        assert_eq!(config.database, Some("inventory".to_string()));
        assert_eq!(config.username, Some("auditor".to_string()));
        assert_eq!(config.effective_auth_source(), "$external");
    }

    #[test]
    fn test_connection_config_display_no_credentials() {
        let config = ConnectionConfig::new("mongo.example.com".to_string())
            .with_port(27017)
            .with_database("testdb".to_string())
            .with_username("testuser".to_string());

        let display = format!("{}", config);

        assert!(display.contains("mongo.example.com"));
        assert!(display.contains("27017"));
        assert!(display.contains("testdb"));
        assert!(!display.contains("testuser"));
    }
}
