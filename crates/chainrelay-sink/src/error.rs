//! Error types for the sink adapter.

use thiserror::Error;

/// Errors from one remote sink call. Every failure path produces a value;
/// there is no sentinel reply and nothing is silently dropped.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Sink returned RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Sink reply did not deserialize: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Sink reply carried neither a result nor an error")]
    InvalidReply,
}
