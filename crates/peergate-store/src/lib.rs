//! Peergate Store
//!
//! This crate provides the storage trait and implementations for the records
//! a host orchestrator owns: registered workflows, workflow runs and the task
//! executions within each run.
//!
//! The [`Store`] trait defines operations for:
//! - Looking up workflow records and counting active runs (read side, used
//!   by sensors)
//! - Registering workflows and recording run and task state (host side)

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::{RunState, TaskExecution, TaskState, WorkflowRecord, WorkflowRun};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Storage trait for workflows, runs and task executions.
#[async_trait]
pub trait Store: Send + Sync {
  /// Get a workflow record by ID, if one is registered.
  async fn get_workflow(&self, workflow_id: &str) -> Result<Option<WorkflowRecord>, StoreError>;

  /// Count runs of the given workflows that are running and whose
  /// `checkpoint_task_id` task has succeeded.
  ///
  /// Each run is counted once. An empty set of workflow IDs counts zero.
  async fn count_active_runs(
    &self,
    workflow_ids: &[String],
    checkpoint_task_id: &str,
  ) -> Result<u64, StoreError>;

  /// Register a workflow, replacing any existing record with the same ID.
  async fn register_workflow(&self, workflow: &WorkflowRecord) -> Result<(), StoreError>;

  /// Create a new workflow run.
  async fn create_run(&self, run: &WorkflowRun) -> Result<(), StoreError>;

  /// Get a workflow run by ID.
  async fn get_run(&self, run_id: &str) -> Result<WorkflowRun, StoreError>;

  /// Update the state of a workflow run.
  ///
  /// Moving to a terminal state records the completion time.
  async fn update_run_state(&self, run_id: &str, state: RunState) -> Result<(), StoreError>;

  /// List runs for a workflow, most recent first.
  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>, StoreError>;

  /// Insert or replace the execution of a task within a run.
  async fn upsert_task_execution(&self, task: &TaskExecution) -> Result<(), StoreError>;

  /// List task executions for a run.
  async fn list_task_executions(&self, run_id: &str) -> Result<Vec<TaskExecution>, StoreError>;
}
