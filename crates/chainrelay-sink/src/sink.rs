//! The `EventSink` trait: where decoded events leave the relay.

use crate::error::SinkError;
use crate::request::BlockTransaction;
use async_trait::async_trait;

/// Remote destination for decoded chain events.
///
/// Every call is unary and at-most-once: the pipeline blocks on it, logs
/// a failure, and moves on. There is no retry and no buffering behind
/// the sink. Implementations must be shareable across threads.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Forward a named action with a JSON body. Also used for the startup
    /// handshake.
    async fn send_action(&self, action: &str, json: &str) -> Result<String, SinkError>;

    /// Forward one token transfer.
    async fn send_transfer(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        memo: &str,
        trx_id: &str,
    ) -> Result<String, SinkError>;

    /// Forward one decoded transaction.
    async fn send_transaction(
        &self,
        block_num: u64,
        trx_json: &str,
        trx_id: &str,
    ) -> Result<String, SinkError>;

    /// Forward an irreversible block's decoded transactions.
    async fn send_block(
        &self,
        block_num: u64,
        transactions: Vec<BlockTransaction>,
    ) -> Result<String, SinkError>;
}
