use async_trait::async_trait;
use peergate_store::Store;

use crate::context::PokeContext;
use crate::error::SensorError;

/// A condition the host polls until it reports ready.
///
/// The host calls [`Sensor::poke`] serially for a given instance and stops
/// once it returns `Ok(true)`. The store handle is only valid for the
/// duration of the call and must not be retained.
#[async_trait]
pub trait Sensor: Send {
  /// Short name used in logs.
  fn name(&self) -> &str;

  /// Evaluate the condition once.
  async fn poke(&mut self, ctx: &PokeContext, store: &dyn Store) -> Result<bool, SensorError>;
}
