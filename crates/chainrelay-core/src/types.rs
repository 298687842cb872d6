//! Chain event types handed to the relay by the host node.
//!
//! These are plain data carriers: the relay never mutates them, it only
//! holds shared handles long enough to decode and forward.

use crate::name::{AccountName, ActionName, PermissionName};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Seconds since the Unix epoch, rendered ISO-8601 (UTC, no suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TimePointSec(pub u32);

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::from_timestamp(self.0 as i64, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let dt = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S")
            .map_err(serde::de::Error::custom)?;
        Ok(TimePointSec(dt.and_utc().timestamp() as u32))
    }
}

/// SHA-256 of a packed transaction, hex-encoded in string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub [u8; 32]);

impl TransactionId {
    /// Id of a packed payload: the digest of its raw bytes.
    pub fn hash(raw: &[u8]) -> Self {
        let digest = Sha256::digest(raw);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

impl FromStr for TransactionId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hex string (de)serialization for opaque byte payloads.
pub mod hex_bytes {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Bytes::from).map_err(serde::de::Error::custom)
    }
}

/// An actor acting under one of its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: AccountName,
    pub permission: PermissionName,
}

/// One contract action: target account, action name, authorizations, and
/// the ABI-encoded argument payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: AccountName,
    pub name: ActionName,
    pub authorization: Vec<PermissionLevel>,
    #[serde(with = "hex_bytes")]
    pub data: Bytes,
}

/// The transaction envelope carried inside a packed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub actions: Vec<Action>,
}

/// A transaction still in wire form. `unpack` decodes the envelope;
/// the id is the digest of the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedTransaction {
    #[serde(with = "hex_bytes")]
    pub raw: Bytes,
}

impl PackedTransaction {
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn id(&self) -> TransactionId {
        TransactionId::hash(&self.raw)
    }
}

/// Execution outcome recorded on a block receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Executed,
    SoftFail,
    HardFail,
    Delayed,
    Expired,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReceiptStatus::Executed => "executed",
            ReceiptStatus::SoftFail => "soft_fail",
            ReceiptStatus::HardFail => "hard_fail",
            ReceiptStatus::Delayed => "delayed",
            ReceiptStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Either the full packed transaction or, for pruned receipts, just its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptTransaction {
    Id(TransactionId),
    Packed(PackedTransaction),
}

/// One transaction slot inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub status: ReceiptStatus,
    pub trx: ReceiptTransaction,
}

/// A produced block, as delivered by both the accepted-block and
/// irreversible-block callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    pub block_num: u64,
    pub timestamp: TimePointSec,
    pub producer: AccountName,
    pub transactions: Vec<TransactionReceipt>,
}

/// An accepted (not yet applied) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub id: TransactionId,
    pub packed: PackedTransaction,
}

/// The execution trace of an applied transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    pub id: TransactionId,
    pub block_num: u64,
    pub elapsed_us: u64,
    pub net_usage_words: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub except: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_point_renders_iso8601() {
        assert_eq!(TimePointSec(0).to_string(), "1970-01-01T00:00:00");
        assert_eq!(TimePointSec(1_700_000_000).to_string(), "2023-11-14T22:13:20");
    }

    #[test]
    fn transaction_id_is_sha256_of_raw() {
        let id = TransactionId::hash(b"abc");
        assert_eq!(
            id.as_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let parsed: TransactionId = id.as_hex().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn receipt_serde_distinguishes_packed_and_pruned() {
        let pruned = TransactionReceipt {
            status: ReceiptStatus::Executed,
            trx: ReceiptTransaction::Id(TransactionId::hash(b"x")),
        };
        let json = serde_json::to_value(&pruned).unwrap();
        assert_eq!(json["status"], "executed");
        assert!(json["trx"].get("id").is_some());

        let packed = TransactionReceipt {
            status: ReceiptStatus::SoftFail,
            trx: ReceiptTransaction::Packed(PackedTransaction::new(vec![1, 2, 3])),
        };
        let json = serde_json::to_value(&packed).unwrap();
        assert_eq!(json["trx"]["packed"]["raw"], "010203");
    }
}
