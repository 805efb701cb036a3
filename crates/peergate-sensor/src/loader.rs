use std::path::{Path, PathBuf};

use async_trait::async_trait;
use peergate_config::WorkflowDef;
use tokio::fs;

use crate::error::LoadError;

/// Reloads workflow definitions from their source locations.
#[async_trait]
pub trait DefinitionLoader: Send + Sync {
  /// Check whether a source location still exists.
  async fn source_exists(&self, source_path: &str) -> bool;

  /// Load the definition of `workflow_id` from a source location.
  ///
  /// Returns `None` if the source no longer defines that workflow.
  async fn load(
    &self,
    source_path: &str,
    workflow_id: &str,
  ) -> Result<Option<WorkflowDef>, LoadError>;
}

/// Filesystem-based definition loader.
///
/// A definition file is JSON holding either a single workflow or an array of
/// them:
/// ```text
/// {root}/
/// ├── ingest.json        { "workflow_id": "ingest", ... }
/// └── reports.json       [{ "workflow_id": "daily", ... }, ...]
/// ```
/// Relative source paths are resolved against the root; absolute paths are
/// used as-is.
#[derive(Debug, Clone, Default)]
pub struct FsDefinitionLoader {
  root: Option<PathBuf>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
  Many(Vec<WorkflowDef>),
  Single(WorkflowDef),
}

impl FsDefinitionLoader {
  /// Create a loader that resolves paths against the working directory.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a loader that resolves relative paths against `root`.
  pub fn with_root(root: impl Into<PathBuf>) -> Self {
    Self {
      root: Some(root.into()),
    }
  }

  fn resolve(&self, source_path: &str) -> PathBuf {
    let path = Path::new(source_path);
    match &self.root {
      Some(root) if path.is_relative() => root.join(path),
      _ => path.to_path_buf(),
    }
  }
}

#[async_trait]
impl DefinitionLoader for FsDefinitionLoader {
  async fn source_exists(&self, source_path: &str) -> bool {
    fs::try_exists(self.resolve(source_path))
      .await
      .unwrap_or(false)
  }

  async fn load(
    &self,
    source_path: &str,
    workflow_id: &str,
  ) -> Result<Option<WorkflowDef>, LoadError> {
    let content = fs::read_to_string(self.resolve(source_path)).await?;
    let defs = match serde_json::from_str(&content)? {
      DefinitionFile::Many(defs) => defs,
      DefinitionFile::Single(def) => vec![def],
    };

    Ok(defs.into_iter().find(|d| d.workflow_id == workflow_id))
  }
}
