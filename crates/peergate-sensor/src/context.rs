use serde::{Deserialize, Serialize};

/// Identity of the task instance that is polling a sensor.
///
/// Supplied by the host on every poke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokeContext {
  pub workflow_id: String,
  pub run_id: String,
  /// ID of the task doing the waiting.
  pub task_id: String,
  #[serde(default = "default_attempt")]
  pub attempt: u32,
}

fn default_attempt() -> u32 {
  1
}

impl PokeContext {
  pub fn new(
    workflow_id: impl Into<String>,
    run_id: impl Into<String>,
    task_id: impl Into<String>,
  ) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      run_id: run_id.into(),
      task_id: task_id.into(),
      attempt: default_attempt(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_starts_at_first_attempt() {
    let ctx = PokeContext::new("ingest", "run-1", "wait_task");
    assert_eq!(ctx.attempt, 1);
  }

  #[test]
  fn test_attempt_defaults_when_absent() {
    let ctx: PokeContext = serde_json::from_str(
      r#"{ "workflow_id": "ingest", "run_id": "run-1", "task_id": "wait_task" }"#,
    )
    .unwrap();
    assert_eq!(ctx, PokeContext::new("ingest", "run-1", "wait_task"));

    let retried: PokeContext = serde_json::from_str(
      r#"{ "workflow_id": "ingest", "run_id": "run-1", "task_id": "wait_task", "attempt": 3 }"#,
    )
    .unwrap();
    assert_eq!(retried.attempt, 3);
  }
}
