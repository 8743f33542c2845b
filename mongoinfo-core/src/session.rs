//! One-call collection session: version gate, aggregation, filtering.

use crate::Result;
use crate::aggregator::InstanceInfoAggregator;
use crate::client::AdminCommandClient;
use crate::config::AggregatorConfig;
use crate::error::MongoInfoError;
use crate::filter::{FilteredInfo, SubsetFilter};
use crate::version::CompatibilityPolicy;
use mongodb::bson::doc;

/// Reads the server version from `buildInfo` on `admin`.
///
/// # Errors
/// Returns the command error, or [`MongoInfoError::MalformedResponse`] if
/// the reply carries no string `version`
pub async fn probe_server_version(client: &dyn AdminCommandClient) -> Result<String> {
    let reply = client.run_command("admin", doc! { "buildInfo": 1 }).await?;
    reply
        .get_str("version")
        .map(str::to_string)
        .map_err(|_| MongoInfoError::malformed("buildInfo", "missing 'version' field"))
}

/// Gates the session on version compatibility, then collects and filters.
///
/// The version probe is the only command issued before the compatibility
/// check passes. Filter warnings are returned alongside the result.
///
/// # Errors
/// Returns [`MongoInfoError::IncompatibleVersions`] or
/// [`MongoInfoError::InvalidVersion`] from the gate, or the first
/// [`MongoInfoError::Collection`] raised during aggregation
///
/// # Example
/// ```rust,no_run
/// use mongoinfo_core::{
///     AggregatorConfig, CompatibilityPolicy, DRIVER_VERSION, MongoCommandClient,
///     gather_instance_info,
/// };
///
/// # async fn run() -> mongoinfo_core::Result<()> {
/// let client = MongoCommandClient::new("mongodb://localhost:27017").await?;
/// let filtered = gather_instance_info(
///     &client,
///     DRIVER_VERSION,
///     &CompatibilityPolicy::default(),
///     &AggregatorConfig::default(),
///     &["!parameters"],
/// )
/// .await?;
/// for warning in &filtered.warnings {
///     eprintln!("{}", warning);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn gather_instance_info<S: AsRef<str>>(
    client: &dyn AdminCommandClient,
    driver_version: &str,
    policy: &CompatibilityPolicy,
    config: &AggregatorConfig,
    tokens: &[S],
) -> Result<FilteredInfo> {
    let aggregator = InstanceInfoAggregator::new(config.clone())?;

    let server_version = probe_server_version(client).await?;
    policy.check(&server_version, driver_version)?;
    tracing::info!(
        "MongoDB server {} is supported by driver {}",
        server_version,
        driver_version
    );

    let info = aggregator.collect(client).await?;
    Ok(SubsetFilter::apply(&info, tokens))
}
