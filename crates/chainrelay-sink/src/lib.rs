//! # chainrelay-sink
//!
//! The remote sink adapter: the [`EventSink`] trait the pipeline forwards
//! through, the four request payload types, and an HTTP JSON-RPC client
//! implementation.

pub mod client;
pub mod error;
pub mod request;
pub mod rpc;
pub mod sink;

pub use client::HttpSinkClient;
pub use error::SinkError;
pub use request::{
    ActionRequest, BlockRequest, BlockTransaction, SinkReply, TransactionRequest, TransferRequest,
};
pub use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use sink::EventSink;
