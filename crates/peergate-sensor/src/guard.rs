//! Single-run guard.
//!
//! The `SingleRunGuard` waits until none of its peer workflows has a run
//! that is currently active. A peer run is active when the run itself is in
//! the running state and its checkpoint task has succeeded. Each peer is
//! expected to carry a guard of its own at the checkpoint task, so a run
//! that has passed its guard blocks all of its peers until it finishes.

use async_trait::async_trait;
use peergate_config::GuardConfig;
use peergate_store::Store;
use tracing::{debug, info, instrument, warn};

use crate::context::PokeContext;
use crate::error::SensorError;
use crate::loader::{DefinitionLoader, FsDefinitionLoader};
use crate::sensor::Sensor;

/// Whether the one-time parameter checks have run for a guard instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
  Unvalidated,
  Validated,
}

/// Guard that holds a run back while any peer workflow is active.
///
/// Generic over `L: DefinitionLoader` so peer definitions can be reloaded
/// from somewhere other than the filesystem.
pub struct SingleRunGuard<L: DefinitionLoader = FsDefinitionLoader> {
  config: GuardConfig,
  peers: Vec<String>,
  loader: L,
  state: ValidationState,
}

impl SingleRunGuard<FsDefinitionLoader> {
  /// Create a guard that reloads peer definitions from the filesystem.
  pub fn new(config: GuardConfig) -> Self {
    Self::with_loader(config, FsDefinitionLoader::new())
  }
}

impl<L: DefinitionLoader> SingleRunGuard<L> {
  /// Create a guard with a custom definition loader.
  pub fn with_loader(config: GuardConfig, loader: L) -> Self {
    let mut peers = config.peer_workflow_ids.clone();
    peers.sort();
    peers.dedup();

    if peers.is_empty() {
      warn!("single-run guard has no peer workflows and will always be ready");
    }

    Self {
      config,
      peers,
      loader,
      state: ValidationState::Unvalidated,
    }
  }

  pub fn config(&self) -> &GuardConfig {
    &self.config
  }

  /// Peer workflow IDs, sorted and deduplicated.
  pub fn peers(&self) -> &[String] {
    &self.peers
  }

  pub fn state(&self) -> ValidationState {
    self.state
  }

  /// The task whose success marks a peer run as active.
  fn checkpoint_task_id<'a>(&'a self, ctx: &'a PokeContext) -> &'a str {
    self
      .config
      .checkpoint_task_id
      .as_deref()
      .unwrap_or(&ctx.task_id)
  }

  /// Verify every peer is registered, its source still exists, and its
  /// reloaded definition has the checkpoint task.
  async fn check_existence(&self, store: &dyn Store, checkpoint: &str) -> Result<(), SensorError> {
    for workflow_id in &self.peers {
      let record = store
        .get_workflow(workflow_id)
        .await?
        .ok_or_else(|| SensorError::PeerNotFound {
          workflow_id: workflow_id.clone(),
        })?;

      if !self.loader.source_exists(&record.source_path).await {
        return Err(SensorError::PeerSourceMissing {
          workflow_id: workflow_id.clone(),
          source_path: record.source_path,
        });
      }

      let def = self
        .loader
        .load(&record.source_path, workflow_id)
        .await
        .map_err(|e| SensorError::PeerDefinitionInvalid {
          workflow_id: workflow_id.clone(),
          message: e.to_string(),
        })?
        .ok_or_else(|| SensorError::PeerDefinitionInvalid {
          workflow_id: workflow_id.clone(),
          message: format!("'{}' no longer defines it", record.source_path),
        })?;

      if !def.has_task(checkpoint) {
        return Err(SensorError::PeerMissingCheckpoint {
          workflow_id: workflow_id.clone(),
          task_id: checkpoint.to_string(),
        });
      }

      debug!(workflow_id = %workflow_id, "peer workflow validated");
    }

    Ok(())
  }
}

#[async_trait]
impl<L: DefinitionLoader> Sensor for SingleRunGuard<L> {
  fn name(&self) -> &str {
    "single_run_guard"
  }

  #[instrument(
    name = "single_run_guard_poke",
    skip(self, ctx, store),
    fields(
      workflow_id = %ctx.workflow_id,
      run_id = %ctx.run_id,
      task_id = %ctx.task_id,
      attempt = ctx.attempt,
    )
  )]
  async fn poke(&mut self, ctx: &PokeContext, store: &dyn Store) -> Result<bool, SensorError> {
    info!(peers = ?self.peers, "poking for peer workflows");

    if self.config.allow_concurrent_runs {
      if self.state == ValidationState::Unvalidated {
        info!("allow_concurrent_runs is enabled, not checking for running peers");
        self.state = ValidationState::Validated;
      }
      return Ok(true);
    }

    let checkpoint = self.checkpoint_task_id(ctx).to_string();

    if self.state == ValidationState::Unvalidated {
      if self.config.check_existence {
        self.check_existence(store, &checkpoint).await?;
      }
      self.state = ValidationState::Validated;
    }

    let count = store.count_active_runs(&self.peers, &checkpoint).await?;
    info!(count, checkpoint = %checkpoint, "peer runs in the running state");

    Ok(count == 0)
  }
}
