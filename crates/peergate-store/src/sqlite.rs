use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::{RunState, Store, StoreError, TaskExecution, TaskState, WorkflowRecord, WorkflowRun};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Get the underlying connection pool.
  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await
  }
}

#[async_trait]
impl Store for SqliteStore {
  async fn get_workflow(&self, workflow_id: &str) -> Result<Option<WorkflowRecord>, StoreError> {
    let record = sqlx::query_as(
      r#"
            SELECT workflow_id, source_path, registered_at
            FROM workflows
            WHERE workflow_id = ?
            "#,
    )
    .bind(workflow_id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(record)
  }

  async fn count_active_runs(
    &self,
    workflow_ids: &[String],
    checkpoint_task_id: &str,
  ) -> Result<u64, StoreError> {
    if workflow_ids.is_empty() {
      return Ok(0);
    }

    let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
      r#"
            SELECT COUNT(DISTINCT r.run_id)
            FROM workflow_runs r
            JOIN task_executions t ON t.run_id = r.run_id
            WHERE r.state = "#,
    );
    query.push_bind(RunState::Running);
    query.push(" AND t.task_id = ");
    query.push_bind(checkpoint_task_id);
    query.push(" AND t.state = ");
    query.push_bind(TaskState::Success);
    query.push(" AND r.workflow_id IN (");
    let mut ids = query.separated(", ");
    for workflow_id in workflow_ids {
      ids.push_bind(workflow_id.as_str());
    }
    ids.push_unseparated(")");

    let count = query
      .build_query_scalar::<i64>()
      .fetch_one(&self.pool)
      .await?;
    debug!(count, checkpoint_task_id, "counted active runs");

    Ok(u64::try_from(count).unwrap_or_default())
  }

  async fn register_workflow(&self, workflow: &WorkflowRecord) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflows (workflow_id, source_path, registered_at)
            VALUES (?, ?, ?)
            ON CONFLICT (workflow_id) DO UPDATE
            SET source_path = excluded.source_path, registered_at = excluded.registered_at
            "#,
    )
    .bind(&workflow.workflow_id)
    .bind(&workflow.source_path)
    .bind(workflow.registered_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn create_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflow_runs (run_id, workflow_id, state, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(&run.run_id)
    .bind(&run.workflow_id)
    .bind(run.state)
    .bind(run.started_at)
    .bind(run.completed_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_run(&self, run_id: &str) -> Result<WorkflowRun, StoreError> {
    sqlx::query_as(
      r#"
            SELECT run_id, workflow_id, state, started_at, completed_at
            FROM workflow_runs
            WHERE run_id = ?
            "#,
    )
    .bind(run_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("run {run_id}")))
  }

  async fn update_run_state(&self, run_id: &str, state: RunState) -> Result<(), StoreError> {
    let completed_at = state.is_terminal().then(Utc::now);

    let result = sqlx::query(
      r#"
            UPDATE workflow_runs
            SET state = ?, completed_at = ?
            WHERE run_id = ?
            "#,
    )
    .bind(state)
    .bind(completed_at)
    .bind(run_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("run {run_id}")));
    }

    Ok(())
  }

  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>, StoreError> {
    let runs = sqlx::query_as(
      r#"
            SELECT run_id, workflow_id, state, started_at, completed_at
            FROM workflow_runs
            WHERE workflow_id = ?
            ORDER BY started_at DESC
            "#,
    )
    .bind(workflow_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(runs)
  }

  async fn upsert_task_execution(&self, task: &TaskExecution) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO task_executions (run_id, task_id, state, attempt, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (run_id, task_id) DO UPDATE
            SET state = excluded.state,
                attempt = excluded.attempt,
                started_at = excluded.started_at,
                completed_at = excluded.completed_at
            "#,
    )
    .bind(&task.run_id)
    .bind(&task.task_id)
    .bind(task.state)
    .bind(task.attempt)
    .bind(task.started_at)
    .bind(task.completed_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn list_task_executions(&self, run_id: &str) -> Result<Vec<TaskExecution>, StoreError> {
    let tasks = sqlx::query_as(
      r#"
            SELECT run_id, task_id, state, attempt, started_at, completed_at
            FROM task_executions
            WHERE run_id = ?
            ORDER BY started_at ASC
            "#,
    )
    .bind(run_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(tasks)
  }
}
