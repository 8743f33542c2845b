//! `databases` and `total_size` subsets from `listDatabases`.

use super::normalize::normalize_size;
use crate::Result;
use crate::client::AdminCommandClient;
use crate::error::MongoInfoError;
use crate::models::Subset;
use mongodb::bson::{Bson, Document, doc};

const COMMAND: &str = "listDatabases";

/// Per-database statistics plus the instance total size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseListing {
    /// Database name to its entry without `name`, in server order
    pub databases: Document,
    /// Total size in bytes
    pub total_size: i64,
}

impl DatabaseListing {
    /// Database names in the order the server listed them.
    pub fn names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }
}

/// Collects per-database statistics and the total size.
///
/// Entries without a string `name` are skipped. When `totalSize` is absent
/// the sum of the listed `sizeOnDisk` values is used instead.
///
/// # Errors
/// Returns [`MongoInfoError::Collection`] tagged with [`Subset::Databases`]
/// if the command fails or a size is not representable, and with
/// [`Subset::TotalSize`] if `totalSize` itself is invalid
pub async fn collect_databases(client: &dyn AdminCommandClient) -> Result<DatabaseListing> {
    tracing::debug!("Running listDatabases on admin");
    let reply = client
        .run_command("admin", doc! { "listDatabases": 1 })
        .await
        .map_err(|e| MongoInfoError::collection_failed(Subset::Databases, "listDatabases on admin", e))?;

    let entries = reply.get_array("databases").map_err(|_| {
        MongoInfoError::collection_failed(
            Subset::Databases,
            "listDatabases on admin",
            MongoInfoError::malformed(COMMAND, "missing 'databases' array"),
        )
    })?;

    let mut databases = Document::new();
    let mut listed_total: i64 = 0;

    for entry in entries {
        let Bson::Document(entry) = entry else {
            tracing::warn!("Skipping non-document entry in listDatabases response");
            continue;
        };
        let Ok(name) = entry.get_str("name") else {
            tracing::warn!("Skipping listDatabases entry without a string 'name'");
            continue;
        };
        let name = name.to_string();

        let mut stats = Document::new();
        for (key, value) in entry {
            match key.as_str() {
                "name" => {}
                "sizeOnDisk" => {
                    let size = normalize_size(key, value).map_err(|e| {
                        MongoInfoError::collection_failed(
                            Subset::Databases,
                            format!("sizeOnDisk of database '{}'", name),
                            e,
                        )
                    })?;
                    listed_total = listed_total.saturating_add(size);
                    stats.insert(key.clone(), Bson::Int64(size));
                }
                _ => {
                    stats.insert(key.clone(), value.clone());
                }
            }
        }
        databases.insert(name, stats);
    }

    let total_size = match reply.get("totalSize") {
        Some(value) => normalize_size("totalSize", value).map_err(|e| {
            MongoInfoError::collection_failed(Subset::TotalSize, "listDatabases on admin", e)
        })?,
        None => {
            tracing::debug!(
                "listDatabases returned no totalSize, using sum of sizeOnDisk ({})",
                listed_total
            );
            listed_total
        }
    };

    Ok(DatabaseListing {
        databases,
        total_size,
    })
}
