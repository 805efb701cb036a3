use serde::{Deserialize, Serialize};

/// Configuration of a single-run guard.
///
/// # Examples
///
/// ```json
/// {
///   "peer_workflow_ids": ["ingest_a", "ingest_b"],
///   "check_existence": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
  /// Workflows whose runs this guard waits on.
  pub peer_workflow_ids: Vec<String>,

  /// Verify on the first poke that every peer exists and still defines the
  /// checkpoint task.
  #[serde(default)]
  pub check_existence: bool,

  /// Disable the guard entirely.
  #[serde(default)]
  pub allow_concurrent_runs: bool,

  /// Task id that marks a peer run as active once it has succeeded.
  /// If not specified, the id of the task doing the waiting is used.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checkpoint_task_id: Option<String>,
}

impl GuardConfig {
  /// Create a config watching the given peers, with all flags off.
  pub fn new<I, S>(peer_workflow_ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      peer_workflow_ids: peer_workflow_ids.into_iter().map(Into::into).collect(),
      check_existence: false,
      allow_concurrent_runs: false,
      checkpoint_task_id: None,
    }
  }

  pub fn with_check_existence(mut self, check_existence: bool) -> Self {
    self.check_existence = check_existence;
    self
  }

  pub fn with_allow_concurrent_runs(mut self, allow_concurrent_runs: bool) -> Self {
    self.allow_concurrent_runs = allow_concurrent_runs;
    self
  }

  pub fn with_checkpoint_task_id(mut self, task_id: impl Into<String>) -> Self {
    self.checkpoint_task_id = Some(task_id.into());
    self
  }

  /// Parse a config from JSON.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }
}
