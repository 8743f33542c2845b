//! Server-wide subsets: build information and runtime parameters.

use crate::Result;
use crate::client::AdminCommandClient;
use crate::error::MongoInfoError;
use crate::models::Subset;
use mongodb::bson::{Document, doc};

/// Collects the `general` subset from `buildInfo` on `admin`.
///
/// # Errors
/// Returns [`MongoInfoError::Collection`] tagged with [`Subset::General`]
pub async fn collect_general(client: &dyn AdminCommandClient) -> Result<Document> {
    tracing::debug!("Running buildInfo on admin");
    client
        .run_command("admin", doc! { "buildInfo": 1 })
        .await
        .map_err(|e| MongoInfoError::collection_failed(Subset::General, "buildInfo on admin", e))
}

/// Collects the `parameters` subset from `getParameter: "*"` on `admin`.
///
/// # Errors
/// Returns [`MongoInfoError::Collection`] tagged with [`Subset::Parameters`]
pub async fn collect_parameters(client: &dyn AdminCommandClient) -> Result<Document> {
    tracing::debug!("Running getParameter on admin");
    client
        .run_command("admin", doc! { "getParameter": "*" })
        .await
        .map_err(|e| {
            MongoInfoError::collection_failed(Subset::Parameters, "getParameter on admin", e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockCommandClient;

    #[tokio::test]
    async fn test_general_is_verbatim() {
        let reply = doc! { "version": "7.0.5", "gitVersion": "abc", "ok": 1.0 };
        let client = MockCommandClient::new().with_response("admin", "buildInfo", reply.clone());

        assert_eq!(collect_general(&client).await.unwrap(), reply);
        assert_eq!(client.issued()[0].command, doc! { "buildInfo": 1 });
    }

    #[tokio::test]
    async fn test_parameters_requests_all() {
        let reply = doc! { "authenticationMechanisms": ["SCRAM-SHA-256"], "ok": 1.0 };
        let client =
            MockCommandClient::new().with_response("admin", "getParameter", reply.clone());

        assert_eq!(collect_parameters(&client).await.unwrap(), reply);
        assert_eq!(client.issued()[0].command, doc! { "getParameter": "*" });
    }

    #[tokio::test]
    async fn test_failures_are_tagged() {
        let client = MockCommandClient::new()
            .with_failure("admin", "buildInfo", "network timeout")
            .with_failure("admin", "getParameter", "unauthorized");

        let err = collect_general(&client).await.unwrap_err();
        assert_eq!(err.failed_subset(), Some(Subset::General));
        assert!(err.to_string().contains("network timeout"));

        let err = collect_parameters(&client).await.unwrap_err();
        assert_eq!(err.failed_subset(), Some(Subset::Parameters));
    }
}
