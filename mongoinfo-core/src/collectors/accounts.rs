//! Per-database `users` and `roles` subsets.

use super::normalize::convert_uuid_fields;
use crate::Result;
use crate::client::AdminCommandClient;
use crate::config::EntityKeyMode;
use crate::error::MongoInfoError;
use crate::models::Subset;
use mongodb::bson::{Bson, Document, doc};

/// Collects the users defined in `database`.
///
/// Each entry is keyed according to `keys`, loses its `user` field and has
/// its top-level UUID binaries (such as `userId`) rendered as hex.
///
/// # Errors
/// Returns [`MongoInfoError::Collection`] tagged with [`Subset::Users`]
pub async fn collect_users(
    client: &dyn AdminCommandClient,
    database: &str,
    keys: EntityKeyMode,
) -> Result<Document> {
    tracing::debug!("Running usersInfo on '{}'", database);
    let reply = client
        .run_command(database, doc! { "usersInfo": 1 })
        .await
        .map_err(|e| {
            MongoInfoError::collection_failed(
                Subset::Users,
                format!("usersInfo on '{}'", database),
                e,
            )
        })?;

    let entries = keyed_entries(&reply, "usersInfo", "users", "user", database, keys)
        .map_err(|e| {
            MongoInfoError::collection_failed(
                Subset::Users,
                format!("usersInfo on '{}'", database),
                e,
            )
        })?;

    Ok(entries
        .into_iter()
        .map(|(key, attributes)| (key, Bson::Document(convert_uuid_fields(attributes))))
        .collect())
}

/// Collects the roles defined in `database`.
///
/// # Errors
/// Returns [`MongoInfoError::Collection`] tagged with [`Subset::Roles`]
pub async fn collect_roles(
    client: &dyn AdminCommandClient,
    database: &str,
    keys: EntityKeyMode,
    include_builtin: bool,
) -> Result<Document> {
    tracing::debug!("Running rolesInfo on '{}'", database);
    let reply = client
        .run_command(
            database,
            doc! { "rolesInfo": 1, "showBuiltinRoles": include_builtin },
        )
        .await
        .map_err(|e| {
            MongoInfoError::collection_failed(
                Subset::Roles,
                format!("rolesInfo on '{}'", database),
                e,
            )
        })?;

    let entries = keyed_entries(&reply, "rolesInfo", "roles", "role", database, keys)
        .map_err(|e| {
            MongoInfoError::collection_failed(
                Subset::Roles,
                format!("rolesInfo on '{}'", database),
                e,
            )
        })?;

    Ok(entries
        .into_iter()
        .map(|(key, attributes)| (key, Bson::Document(attributes)))
        .collect())
}

/// Splits `reply[array]` into `(key, entry without key_field)` pairs.
fn keyed_entries(
    reply: &Document,
    command: &str,
    array: &str,
    key_field: &str,
    database: &str,
    keys: EntityKeyMode,
) -> Result<Vec<(String, Document)>> {
    let entries = reply
        .get_array(array)
        .map_err(|_| MongoInfoError::malformed(command, format!("missing '{}' array", array)))?;

    let mut keyed = Vec::with_capacity(entries.len());
    for entry in entries {
        let Bson::Document(entry) = entry else {
            tracing::warn!("Skipping non-document entry in {} response", command);
            continue;
        };
        let Ok(name) = entry.get_str(key_field) else {
            tracing::warn!(
                "Skipping {} entry on '{}' without a string '{}'",
                command,
                database,
                key_field
            );
            continue;
        };

        let key = keys.key(database, name);
        let attributes: Document = entry
            .iter()
            .filter(|(field, _)| field.as_str() != key_field)
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        keyed.push((key, attributes));
    }

    Ok(keyed)
}
