//! Payload types for the four sink operations.

use serde::{Deserialize, Serialize};

/// Parameter of `relay_sendAction`: a named action and its JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub json: String,
}

/// Parameter of `relay_sendTransfer`: one token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub memo: String,
    pub trx_id: String,
}

/// Parameter of `relay_sendTransaction`: one decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub block_num: u64,
    pub trx: String,
    pub trx_id: String,
}

/// One decoded transaction inside a block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTransaction {
    /// Decoded transaction as JSON text.
    pub trx: String,
    pub trx_id: String,
}

/// Parameter of `relay_sendBlock`: an irreversible block's decoded
/// transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRequest {
    pub block_num: u64,
    pub transactions: Vec<BlockTransaction>,
}

/// Result object every sink method answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReply {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_request_shape() {
        let req = BlockRequest {
            block_num: 1234,
            transactions: vec![BlockTransaction {
                trx: "{\"actions\":[]}".into(),
                trx_id: "ab".repeat(32),
            }],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["block_num"], 1234);
        assert_eq!(value["transactions"][0]["trx_id"], "ab".repeat(32));
    }

    #[test]
    fn transfer_and_transaction_shapes() {
        let transfer = TransferRequest {
            from: "alice".into(),
            to: "bob".into(),
            amount: "1.0000 SYS".into(),
            memo: "rent".into(),
            trx_id: "ab".repeat(32),
        };
        let value = serde_json::to_value(&transfer).unwrap();
        assert_eq!(value["from"], "alice");
        assert_eq!(value["amount"], "1.0000 SYS");

        let trx = TransactionRequest {
            block_num: 77,
            trx: "{\"actions\":[]}".into(),
            trx_id: "cd".repeat(32),
        };
        let value = serde_json::to_value(&trx).unwrap();
        assert_eq!(value["block_num"], 77);
        assert_eq!(value["trx_id"], "cd".repeat(32));
    }

    #[test]
    fn reply_round_trip() {
        let reply: SinkReply = serde_json::from_value(json!({ "message": "ok" })).unwrap();
        assert_eq!(reply.message, "ok");
    }
}
