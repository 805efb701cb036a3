//! Sensor errors.

use peergate_store::StoreError;

/// Errors that can occur while loading a workflow definition file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("failed to read definition: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse definition: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Errors that can occur while poking a sensor.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
  /// A peer workflow has no registered record.
  #[error("peer workflow '{workflow_id}' does not exist")]
  PeerNotFound { workflow_id: String },

  /// A peer workflow's definition file is gone.
  #[error("peer workflow '{workflow_id}' was deleted: source '{source_path}' not found")]
  PeerSourceMissing {
    workflow_id: String,
    source_path: String,
  },

  /// A peer workflow does not define the checkpoint task.
  #[error("peer workflow '{workflow_id}' does not have a task with id '{task_id}'")]
  PeerMissingCheckpoint {
    workflow_id: String,
    task_id: String,
  },

  /// A peer workflow's definition file could not be reloaded.
  #[error("peer workflow '{workflow_id}' could not be reloaded: {message}")]
  PeerDefinitionInvalid {
    workflow_id: String,
    message: String,
  },

  /// Reading host storage failed.
  #[error("store error: {0}")]
  Store(#[from] StoreError),
}

impl SensorError {
  /// Whether this error should abort the run rather than be retried by the
  /// host's poll loop.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, SensorError::Store(_))
  }
}
