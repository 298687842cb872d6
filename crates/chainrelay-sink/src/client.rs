//! HTTP JSON-RPC sink client backed by `reqwest`.

use crate::error::SinkError;
use crate::request::{
    ActionRequest, BlockRequest, BlockTransaction, SinkReply, TransactionRequest, TransferRequest,
};
use crate::rpc::{JsonRpcRequest, JsonRpcResponse};
use crate::sink::EventSink;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// `EventSink` over HTTP JSON-RPC: one long-lived connection pool, one
/// unary POST per call, no retries.
pub struct HttpSinkClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpSinkClient {
    /// Create a client for the given sink endpoint URL. The address is
    /// validated by the pipeline configuration before it reaches here.
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("failed to build reqwest client");

        Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, param: Value) -> Result<String, SinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, param);

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Http(format!("HTTP {status}: {body}")));
        }

        let rpc: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let result = rpc
            .into_result()
            .map_err(|e| SinkError::Rpc { code: e.code, message: e.message })?
            .ok_or(SinkError::InvalidReply)?;
        let reply: SinkReply = serde_json::from_value(result)?;
        tracing::trace!(method, reply = %reply.message, "sink call succeeded");
        Ok(reply.message)
    }
}

#[async_trait]
impl EventSink for HttpSinkClient {
    async fn send_action(&self, action: &str, json: &str) -> Result<String, SinkError> {
        let param = serde_json::to_value(ActionRequest {
            action: action.to_string(),
            json: json.to_string(),
        })?;
        self.call("relay_sendAction", param).await
    }

    async fn send_transfer(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        memo: &str,
        trx_id: &str,
    ) -> Result<String, SinkError> {
        let param = serde_json::to_value(TransferRequest {
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.to_string(),
            memo: memo.to_string(),
            trx_id: trx_id.to_string(),
        })?;
        self.call("relay_sendTransfer", param).await
    }

    async fn send_transaction(
        &self,
        block_num: u64,
        trx_json: &str,
        trx_id: &str,
    ) -> Result<String, SinkError> {
        let param = serde_json::to_value(TransactionRequest {
            block_num,
            trx: trx_json.to_string(),
            trx_id: trx_id.to_string(),
        })?;
        self.call("relay_sendTransaction", param).await
    }

    async fn send_block(
        &self,
        block_num: u64,
        transactions: Vec<BlockTransaction>,
    ) -> Result<String, SinkError> {
        let param = serde_json::to_value(BlockRequest { block_num, transactions })?;
        self.call("relay_sendBlock", param).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let client = HttpSinkClient::new("http://localhost:9876", Duration::from_secs(5));
        let a = client.next_id.fetch_add(1, Ordering::Relaxed);
        let b = client.next_id.fetch_add(1, Ordering::Relaxed);
        assert!(b > a);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_http_error() {
        // Nothing listens on this port; every operation must fail loudly
        // instead of returning a sentinel reply.
        let client = HttpSinkClient::new("http://127.0.0.1:1", Duration::from_millis(200));

        let err = client.send_action("init", "init--json").await.unwrap_err();
        assert!(matches!(err, SinkError::Http(_)));
        let err = client
            .send_transfer("alice", "bob", "1.0000 SYS", "rent", &"ab".repeat(32))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Http(_)));
        let err = client
            .send_transaction(42, "{}", &"ab".repeat(32))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Http(_)));
        let err = client.send_block(42, Vec::new()).await.unwrap_err();
        assert!(matches!(err, SinkError::Http(_)));
    }
}
