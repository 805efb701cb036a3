use serde::{Deserialize, Serialize};

/// A task within a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDef {
  pub task_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// A workflow definition as stored at its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  #[serde(default)]
  pub tasks: Vec<TaskDef>,
}

impl WorkflowDef {
  /// Get a task by ID.
  pub fn get_task(&self, task_id: &str) -> Option<&TaskDef> {
    self.tasks.iter().find(|t| t.task_id == task_id)
  }

  pub fn has_task(&self, task_id: &str) -> bool {
    self.get_task(task_id).is_some()
  }
}
