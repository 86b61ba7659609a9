//! Launch configuration inventory sources
//!
//! The pipeline only ever talks to an `InventoryClient`. The live AWS sources
//! live in `autoscaling` (SDK) and `aws_cli` (shell-out); this module holds the
//! record type, the shared parser for `describe-launch-configurations` JSON and
//! a source that replays such a document from disk.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{LcFindError, LcFindResult};

/// Name/ARN pair for a single launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfigurationRecord {
    pub name: String,
    pub arn: String,
}

impl LaunchConfigurationRecord {
    pub fn new(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: arn.into(),
        }
    }
}

#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetch every launch configuration in `region`, in source order.
    async fn fetch(&self, region: &str) -> LcFindResult<Vec<LaunchConfigurationRecord>>;
}

/// Parse the JSON printed by `aws autoscaling describe-launch-configurations`.
///
/// An empty body or a document without a `LaunchConfigurations` array yields
/// no records. A body that is not JSON at all is an error.
pub fn parse_describe_output(
    source_name: &str,
    raw: &str,
) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
    if raw.trim().is_empty() {
        warn!("{} returned an empty response", source_name);
        return Ok(Vec::new());
    }

    let document: Value = serde_json::from_str(raw).map_err(|e| {
        LcFindError::external(source_name, format!("malformed JSON response: {}", e))
    })?;

    let Some(entries) = document
        .get("LaunchConfigurations")
        .and_then(Value::as_array)
    else {
        warn!(
            "{} response has no LaunchConfigurations list; treating as empty",
            source_name
        );
        return Ok(Vec::new());
    };

    Ok(entries.iter().filter_map(record_from_entry).collect())
}

fn record_from_entry(entry: &Value) -> Option<LaunchConfigurationRecord> {
    let name = entry.get("LaunchConfigurationName").and_then(Value::as_str);
    let arn = entry.get("LaunchConfigurationARN").and_then(Value::as_str);
    match (name, arn) {
        (Some(name), Some(arn)) => Some(LaunchConfigurationRecord::new(name, arn)),
        _ => {
            debug!("Skipping launch configuration entry without name or ARN");
            None
        }
    }
}

/// Replays a saved `describe-launch-configurations` document.
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InventoryClient for FileInventory {
    async fn fetch(&self, region: &str) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
        debug!(
            "Reading launch configurations for {} from {}",
            region,
            self.path.display()
        );
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            LcFindError::external("file", format!("{}: {}", self.path.display(), e))
        })?;
        parse_describe_output("file", &raw)
    }
}
