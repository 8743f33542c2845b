//! Two-phase orchestration of the subset collectors.
//!
//! Phase 1 runs the server-wide collectors (`buildInfo`, `listDatabases`,
//! `getParameter`) concurrently. Phase 2 needs the database list from phase
//! 1 and fetches users and roles for every database with bounded
//! concurrency. Per-database results are merged in the server's listing
//! order once all of them have completed.

use crate::Result;
use crate::client::AdminCommandClient;
use crate::collectors::{
    DatabaseListing, collect_databases, collect_general, collect_parameters, collect_roles,
    collect_users,
};
use crate::config::AggregatorConfig;
use crate::models::InstanceInfo;
use futures::stream::{self, StreamExt};
use mongodb::bson::Document;
use std::time::Instant;

/// Users and roles collected from a single database.
#[derive(Debug)]
struct DatabaseAccounts {
    database: String,
    users: Document,
    roles: Document,
}

/// Builds an [`InstanceInfo`] from a connected client.
///
/// # Example
/// ```rust,no_run
/// use mongoinfo_core::{AggregatorConfig, InstanceInfoAggregator, MongoCommandClient};
///
/// # async fn run() -> mongoinfo_core::Result<()> {
/// let client = MongoCommandClient::new("mongodb://localhost:27017").await?;
/// let aggregator = InstanceInfoAggregator::new(AggregatorConfig::default())?;
/// let info = aggregator.collect(&client).await?;
/// println!("{} databases, {} bytes", info.database_count(), info.total_size);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstanceInfoAggregator {
    config: AggregatorConfig,
}

impl InstanceInfoAggregator {
    /// Creates an aggregator after validating `config`.
    ///
    /// # Errors
    /// Returns [`crate::MongoInfoError::Configuration`] if `config` is invalid
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Aggregator settings.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Runs every collector and assembles the result.
    ///
    /// # Errors
    /// Returns the first [`crate::MongoInfoError::Collection`] raised by any
    /// collector; no partial result is produced
    pub async fn collect(&self, client: &dyn AdminCommandClient) -> Result<InstanceInfo> {
        let start_time = Instant::now();

        tracing::info!(
            "Starting instance information collection (max_concurrency: {}, entity_keys: {:?})",
            self.config.max_concurrency,
            self.config.entity_keys
        );

        let (general, listing, parameters) = futures::try_join!(
            collect_general(client),
            collect_databases(client),
            collect_parameters(client),
        )?;

        tracing::info!(
            "Collected server information: version {}, {} databases, {} bytes on disk",
            general.get_str("version").unwrap_or("unknown"),
            listing.databases.len(),
            listing.total_size
        );

        let (users, roles) = self.collect_accounts(client, &listing).await?;

        tracing::info!(
            "Instance information collection completed in {:.2}s: {} users, {} roles",
            start_time.elapsed().as_secs_f64(),
            users.len(),
            roles.len()
        );

        Ok(InstanceInfo {
            general,
            databases: listing.databases,
            total_size: listing.total_size,
            parameters,
            users,
            roles,
        })
    }

    /// Phase 2: users and roles for every listed database.
    async fn collect_accounts(
        &self,
        client: &dyn AdminCommandClient,
        listing: &DatabaseListing,
    ) -> Result<(Document, Document)> {
        let names = listing.names();
        let keys = self.config.entity_keys;
        let include_builtin = self.config.include_builtin_roles;

        let account_futures = names.iter().enumerate().map(|(index, database)| async move {
            let start = Instant::now();
            let users = collect_users(client, database, keys).await?;
            let roles = collect_roles(client, database, keys, include_builtin).await?;
            tracing::debug!(
                "Collected {} users and {} roles from '{}' in {}ms",
                users.len(),
                roles.len(),
                database,
                start.elapsed().as_millis()
            );
            Ok::<_, crate::MongoInfoError>((
                index,
                DatabaseAccounts {
                    database: database.clone(),
                    users,
                    roles,
                },
            ))
        });

        let mut stream =
            stream::iter(account_futures).buffer_unordered(self.config.max_concurrency);

        let mut completed: Vec<Option<DatabaseAccounts>> = Vec::new();
        completed.resize_with(names.len(), || None);
        while let Some(result) = stream.next().await {
            let (index, accounts) = result?;
            if let Some(slot) = completed.get_mut(index) {
                *slot = Some(accounts);
            }
        }

        let mut users = Document::new();
        let mut roles = Document::new();
        for accounts in completed.into_iter().flatten() {
            merge_into(&mut users, accounts.users, &accounts.database, "user");
            merge_into(&mut roles, accounts.roles, &accounts.database, "role");
        }

        Ok((users, roles))
    }
}

fn merge_into(target: &mut Document, entries: Document, database: &str, kind: &str) {
    for (key, value) in entries {
        if target.contains_key(&key) {
            tracing::debug!("{} '{}' from '{}' replaces an earlier entry", kind, key, database);
        }
        target.insert(key, value);
    }
}
