//! Error types for pipeline startup and shutdown.

use chainrelay_core::error::AbiError;
use chainrelay_sink::SinkError;
use thiserror::Error;

/// Errors surfaced while bringing the relay up or tearing it down. All of
/// these abort startup; once the pipeline runs, per-event failures are
/// logged and contained instead.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Failed to seed ABI for account '{account}': {source}")]
    AbiSeed {
        account: String,
        #[source]
        source: AbiError,
    },

    #[error("Sink handshake failed: {source}")]
    SinkHandshake {
        #[source]
        source: SinkError,
    },

    #[error("Runtime startup failed: {0}")]
    Runtime(#[from] std::io::Error),
}
