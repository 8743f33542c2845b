//! Rendering and writing of collection results.

use mongodb::bson::{Bson, Document};
use mongoinfo_core::{MongoInfoError, Result};
use std::path::Path;

/// Renders filtered subsets as relaxed Extended JSON.
pub fn render_json(subsets: &Document, pretty: bool) -> Result<String> {
    let value = Bson::Document(subsets.clone()).into_relaxed_extjson();

    let rendered = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };

    rendered.map_err(|e| MongoInfoError::Serialization {
        context: "Failed to render instance information as JSON".to_string(),
        source: e,
    })
}

/// Writes `json` to `output_path`, or to stdout when no path is given.
pub async fn write_output(json: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            tokio::fs::write(path, format!("{}\n", json))
                .await
                .map_err(|e| MongoInfoError::Io {
                    context: format!("Failed to write to {}", path.display()),
                    source: e,
                })?;
            tracing::info!("Instance information saved to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
