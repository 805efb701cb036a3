use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// State of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RunState {
  Queued,
  Running,
  Success,
  Failed,
}

impl RunState {
  pub fn is_terminal(self) -> bool {
    matches!(self, RunState::Success | RunState::Failed)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      RunState::Queued => "queued",
      RunState::Running => "running",
      RunState::Success => "success",
      RunState::Failed => "failed",
    }
  }
}

/// State of a task execution within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskState {
  Scheduled,
  Queued,
  Running,
  Success,
  Failed,
  Skipped,
  UpstreamFailed,
}

impl TaskState {
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      TaskState::Success | TaskState::Failed | TaskState::Skipped | TaskState::UpstreamFailed
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      TaskState::Scheduled => "scheduled",
      TaskState::Queued => "queued",
      TaskState::Running => "running",
      TaskState::Success => "success",
      TaskState::Failed => "failed",
      TaskState::Skipped => "skipped",
      TaskState::UpstreamFailed => "upstream_failed",
    }
  }
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl fmt::Display for TaskState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RunState {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "queued" => Ok(RunState::Queued),
      "running" => Ok(RunState::Running),
      "success" => Ok(RunState::Success),
      "failed" => Ok(RunState::Failed),
      other => Err(format!("unknown run state: {other}")),
    }
  }
}

impl FromStr for TaskState {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "scheduled" => Ok(TaskState::Scheduled),
      "queued" => Ok(TaskState::Queued),
      "running" => Ok(TaskState::Running),
      "success" => Ok(TaskState::Success),
      "failed" => Ok(TaskState::Failed),
      "skipped" => Ok(TaskState::Skipped),
      "upstream_failed" => Ok(TaskState::UpstreamFailed),
      other => Err(format!("unknown task state: {other}")),
    }
  }
}

/// A registered workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRecord {
  pub workflow_id: String,
  /// Location of the definition file the workflow was loaded from.
  pub source_path: String,
  pub registered_at: DateTime<Utc>,
}

/// A workflow run as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRun {
  pub run_id: String,
  pub workflow_id: String,
  pub state: RunState,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

/// A task execution within a run as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TaskExecution {
  pub run_id: String,
  pub task_id: String,
  pub state: TaskState,
  pub attempt: i32,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}
