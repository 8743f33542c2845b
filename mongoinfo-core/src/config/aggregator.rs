//! Instance information collection settings.

use serde::{Deserialize, Serialize};

/// Upper bound for concurrent per-database `usersInfo`/`rolesInfo` calls.
pub const MAX_CONCURRENCY_LIMIT: usize = 32;

/// How user and role entries from different databases are keyed.
///
/// A user named `app` can exist in both `sales` and `billing`. With
/// [`EntityKeyMode::Qualified`] they are reported as `sales.app` and
/// `billing.app`, the same `<db>.<name>` form the server uses for the
/// `_id` of user and role documents. [`EntityKeyMode::Name`] keys by bare
/// name; the entry from the database listed later by `listDatabases`
/// replaces the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKeyMode {
    /// Key by `<database>.<name>`
    #[default]
    Qualified,
    /// Key by bare name, last database wins
    Name,
}

impl EntityKeyMode {
    /// Builds the output key for an entity defined in `database`.
    pub fn key(self, database: &str, name: &str) -> String {
        match self {
            EntityKeyMode::Qualified => format!("{}.{}", database, name),
            EntityKeyMode::Name => name.to_string(),
        }
    }
}

/// Configuration for [`crate::InstanceInfoAggregator`].
///
/// # Example
/// ```rust
/// use mongoinfo_core::{AggregatorConfig, EntityKeyMode};
///
/// let config = AggregatorConfig::new()
///     .with_max_concurrency(8)
///     .with_entity_keys(EntityKeyMode::Name);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Maximum number of databases whose users/roles are fetched at once
    pub max_concurrency: usize,
    /// Keying of `users` and `roles` entries
    pub entity_keys: EntityKeyMode,
    /// Whether `rolesInfo` also reports built-in roles
    pub include_builtin_roles: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            entity_keys: EntityKeyMode::default(),
            include_builtin_roles: true,
        }
    }
}

impl AggregatorConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum per-database concurrency (at least 1).
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Sets how users and roles are keyed.
    pub fn with_entity_keys(mut self, entity_keys: EntityKeyMode) -> Self {
        self.entity_keys = entity_keys;
        self
    }

    /// Sets whether built-in roles are reported.
    pub fn with_builtin_roles(mut self, include_builtin_roles: bool) -> Self {
        self.include_builtin_roles = include_builtin_roles;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if `max_concurrency` is 0 or above the limit
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_concurrency == 0 || self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(crate::error::MongoInfoError::configuration(format!(
                "max_concurrency must be between 1 and {}",
                MAX_CONCURRENCY_LIMIT
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.entity_keys, EntityKeyMode::Qualified);
        assert!(config.include_builtin_roles);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_max_concurrency_clamps_to_one() {
        let config = AggregatorConfig::new().with_max_concurrency(0);
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_validate_rejects_excessive_concurrency() {
        let config = AggregatorConfig {
            max_concurrency: MAX_CONCURRENCY_LIMIT + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AggregatorConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_entity_key_modes() {
        assert_eq!(EntityKeyMode::Qualified.key("sales", "app"), "sales.app");
        assert_eq!(EntityKeyMode::Name.key("sales", "app"), "app");
    }

    #[test]
    fn test_entity_key_mode_serde() {
        let json = serde_json::to_string(&EntityKeyMode::Name).unwrap();
        assert_eq!(json, "\"name\"");
        let parsed: EntityKeyMode = serde_json::from_str("\"qualified\"").unwrap();
        assert_eq!(parsed, EntityKeyMode::Qualified);
    }
}
