//! # chainrelay-pipeline
//!
//! The event-ingestion pipeline: bounded queues with adaptive producer
//! throttling, the background consumer, per-kind event processors, and
//! the [`RelayPlugin`] shell the host integrates against.

pub mod config;
pub mod consumer;
pub mod error;
pub mod plugin;
pub mod processor;
pub mod queue;

pub use config::RelayConfig;
pub use consumer::{RelayEngine, RelayMetrics};
pub use error::RelayError;
pub use plugin::RelayPlugin;
pub use processor::EventProcessor;
pub use queue::{DrainedEvents, EventQueues, QueueSettings};
