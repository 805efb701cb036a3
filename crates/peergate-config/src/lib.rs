//! Peergate Config
//!
//! This crate contains the serializable configuration types for peergate.
//!
//! - [`GuardConfig`] is the construction record of a single-run guard: the
//!   peer workflows it watches and the flags that change its behavior.
//! - [`WorkflowDef`] is the on-disk format of a workflow definition. A
//!   workflow record's source location points at a file in this format, and
//!   the guard reloads it when checking that a peer still carries the
//!   checkpoint task.

mod guard;
mod workflow;

pub use guard::GuardConfig;
pub use workflow::{TaskDef, WorkflowDef};
