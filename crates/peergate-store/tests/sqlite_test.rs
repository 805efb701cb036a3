//! Integration tests for SqliteStore against an in-memory database.

use chrono::Utc;
use peergate_store::{
  RunState, SqliteStore, Store, StoreError, TaskExecution, TaskState, WorkflowRecord, WorkflowRun,
};
use sqlx::sqlite::SqlitePoolOptions;

const CHECKPOINT: &str = "wait_task";

/// Create a migrated store backed by a single in-memory connection.
async fn create_test_store() -> SqliteStore {
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect("sqlite::memory:")
    .await
    .expect("failed to open in-memory database");

  let store = SqliteStore::new(pool);
  store.migrate().await.expect("failed to run migrations");
  store
}

async fn insert_run(store: &SqliteStore, run_id: &str, workflow_id: &str, state: RunState) {
  store
    .create_run(&WorkflowRun {
      run_id: run_id.to_string(),
      workflow_id: workflow_id.to_string(),
      state,
      started_at: Utc::now(),
      completed_at: None,
    })
    .await
    .expect("failed to create run");
}

async fn insert_task(store: &SqliteStore, run_id: &str, task_id: &str, state: TaskState) {
  store
    .upsert_task_execution(&TaskExecution {
      run_id: run_id.to_string(),
      task_id: task_id.to_string(),
      state,
      attempt: 1,
      started_at: Utc::now(),
      completed_at: None,
    })
    .await
    .expect("failed to upsert task execution");
}

fn ids(values: &[&str]) -> Vec<String> {
  values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_get_workflow_missing_returns_none() {
  let store = create_test_store().await;

  let record = store.get_workflow("nope").await.unwrap();
  assert!(record.is_none());
}

#[tokio::test]
async fn test_register_workflow_replaces_source_path() {
  let store = create_test_store().await;

  let mut record = WorkflowRecord {
    workflow_id: "ingest".to_string(),
    source_path: "workflows/ingest.json".to_string(),
    registered_at: Utc::now(),
  };
  store.register_workflow(&record).await.unwrap();

  record.source_path = "workflows/ingest_v2.json".to_string();
  store.register_workflow(&record).await.unwrap();

  let loaded = store.get_workflow("ingest").await.unwrap().unwrap();
  assert_eq!(loaded.source_path, "workflows/ingest_v2.json");
}

#[tokio::test]
async fn test_count_active_runs_counts_running_with_succeeded_checkpoint() {
  let store = create_test_store().await;

  insert_run(&store, "a-1", "A", RunState::Running).await;
  insert_task(&store, "a-1", CHECKPOINT, TaskState::Success).await;

  let count = store
    .count_active_runs(&ids(&["A", "B"]), CHECKPOINT)
    .await
    .unwrap();
  assert_eq!(count, 1);
}

#[tokio::test]
async fn test_count_active_runs_ignores_inactive_runs() {
  let store = create_test_store().await;

  // Finished run with a succeeded checkpoint.
  insert_run(&store, "a-1", "A", RunState::Success).await;
  insert_task(&store, "a-1", CHECKPOINT, TaskState::Success).await;

  // Running, but the checkpoint has not succeeded yet.
  insert_run(&store, "a-2", "A", RunState::Running).await;
  insert_task(&store, "a-2", CHECKPOINT, TaskState::Running).await;

  // Running without any checkpoint execution.
  insert_run(&store, "b-1", "B", RunState::Running).await;

  // Running with a different task succeeded.
  insert_run(&store, "b-2", "B", RunState::Running).await;
  insert_task(&store, "b-2", "load", TaskState::Success).await;

  // Active, but not a watched workflow.
  insert_run(&store, "c-1", "C", RunState::Running).await;
  insert_task(&store, "c-1", CHECKPOINT, TaskState::Success).await;

  let count = store
    .count_active_runs(&ids(&["A", "B"]), CHECKPOINT)
    .await
    .unwrap();
  assert_eq!(count, 0);
}

#[tokio::test]
async fn test_count_active_runs_counts_each_run_once() {
  let store = create_test_store().await;

  insert_run(&store, "a-1", "A", RunState::Running).await;
  insert_task(&store, "a-1", CHECKPOINT, TaskState::Success).await;
  insert_task(&store, "a-1", "load", TaskState::Success).await;
  insert_run(&store, "b-1", "B", RunState::Running).await;
  insert_task(&store, "b-1", CHECKPOINT, TaskState::Success).await;

  let count = store
    .count_active_runs(&ids(&["A", "B", "A"]), CHECKPOINT)
    .await
    .unwrap();
  assert_eq!(count, 2);
}

#[tokio::test]
async fn test_count_active_runs_empty_set_is_zero() {
  let store = create_test_store().await;

  insert_run(&store, "a-1", "A", RunState::Running).await;
  insert_task(&store, "a-1", CHECKPOINT, TaskState::Success).await;

  let count = store.count_active_runs(&[], CHECKPOINT).await.unwrap();
  assert_eq!(count, 0);
}

#[tokio::test]
async fn test_update_run_state_sets_completion_on_terminal_state() {
  let store = create_test_store().await;

  insert_run(&store, "a-1", "A", RunState::Queued).await;

  store
    .update_run_state("a-1", RunState::Running)
    .await
    .unwrap();
  let run = store.get_run("a-1").await.unwrap();
  assert_eq!(run.state, RunState::Running);
  assert!(run.completed_at.is_none());

  store
    .update_run_state("a-1", RunState::Failed)
    .await
    .unwrap();
  let run = store.get_run("a-1").await.unwrap();
  assert_eq!(run.state, RunState::Failed);
  assert!(run.completed_at.is_some());
}

#[tokio::test]
async fn test_update_run_state_unknown_run() {
  let store = create_test_store().await;

  let result = store.update_run_state("ghost", RunState::Success).await;
  assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_get_run_unknown_run() {
  let store = create_test_store().await;

  let result = store.get_run("ghost").await;
  assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_upsert_task_execution_replaces_state() {
  let store = create_test_store().await;

  insert_run(&store, "a-1", "A", RunState::Running).await;
  insert_task(&store, "a-1", CHECKPOINT, TaskState::Running).await;
  insert_task(&store, "a-1", CHECKPOINT, TaskState::Success).await;

  let tasks = store.list_task_executions("a-1").await.unwrap();
  assert_eq!(tasks.len(), 1);
  assert_eq!(tasks[0].state, TaskState::Success);
}

#[tokio::test]
async fn test_list_runs_filters_by_workflow() {
  let store = create_test_store().await;

  insert_run(&store, "a-1", "A", RunState::Success).await;
  insert_run(&store, "a-2", "A", RunState::Running).await;
  insert_run(&store, "b-1", "B", RunState::Running).await;

  let runs = store.list_runs("A").await.unwrap();
  assert_eq!(runs.len(), 2);
  assert!(runs.iter().all(|r| r.workflow_id == "A"));
}
