//! Peergate Sensor
//!
//! This crate provides polling sensors that a host orchestrator evaluates
//! repeatedly until they report ready. The host owns the poll loop (interval,
//! timeout, cancellation) and the storage; a sensor only answers one question
//! per call.
//!
//! [`SingleRunGuard`] delays a run until none of its peer workflows has a run
//! that is both running and past the shared checkpoint task.

mod context;
mod error;
mod guard;
mod loader;
mod sensor;

pub use context::PokeContext;
pub use error::{LoadError, SensorError};
pub use guard::{SingleRunGuard, ValidationState};
pub use loader::{DefinitionLoader, FsDefinitionLoader};
pub use sensor::Sensor;
