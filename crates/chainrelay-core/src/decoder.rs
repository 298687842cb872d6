//! ABI-driven transaction decoding.
//!
//! `AbiDecoder` renders a transaction envelope as structured JSON,
//! resolving each action's owning account through an [`AbiResolver`] and
//! expanding the action's binary payload against the resolved ABI. An
//! action whose account is unknown, or whose payload does not decode
//! cleanly, degrades to its raw hex form; exceeding the per-transaction
//! time budget aborts the whole decode.

use crate::abi::{AbiDef, AbiStructDef};
use crate::cache::AbiCache;
use crate::codec::ByteReader;
use crate::error::DecodeError;
use crate::name::AccountName;
use crate::types::{Action, Transaction};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Nesting bound for struct bases, typedef chains, and containers.
const MAX_DECODE_DEPTH: usize = 32;

/// Capability to look up the ABI for an account.
///
/// Takes `&mut self` because the production implementation is the LRU
/// cache, where a lookup bumps recency.
pub trait AbiResolver {
    fn resolve(&mut self, account: &AccountName) -> Option<Arc<AbiDef>>;
}

impl AbiResolver for AbiCache {
    fn resolve(&mut self, account: &AccountName) -> Option<Arc<AbiDef>> {
        self.lookup(account)
    }
}

/// Fixed-map resolver for offline tooling and tests.
#[derive(Debug, Default)]
pub struct MapResolver {
    abis: HashMap<AccountName, Arc<AbiDef>>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abi(mut self, account: AccountName, abi: AbiDef) -> Self {
        self.abis.insert(account, Arc::new(abi));
        self
    }
}

impl AbiResolver for MapResolver {
    fn resolve(&mut self, account: &AccountName) -> Option<Arc<AbiDef>> {
        self.abis.get(account).cloned()
    }
}

/// Deadline-bounded structural decoder.
#[derive(Debug, Clone)]
pub struct AbiDecoder {
    max_decode_time: Duration,
}

impl AbiDecoder {
    pub fn new(max_decode_time: Duration) -> Self {
        Self { max_decode_time }
    }

    /// Render a transaction as JSON, expanding action payloads where an
    /// ABI resolves. Read-only apart from resolver recency updates;
    /// decoding the same input against unchanged resolver state yields
    /// identical output.
    pub fn transaction_to_variant(
        &self,
        trx: &Transaction,
        resolver: &mut dyn AbiResolver,
    ) -> Result<Value, DecodeError> {
        let deadline = Instant::now() + self.max_decode_time;
        let mut actions = Vec::with_capacity(trx.actions.len());
        for action in &trx.actions {
            actions.push(self.action_to_variant(action, resolver, deadline)?);
        }
        Ok(json!({
            "expiration": trx.expiration.to_string(),
            "ref_block_num": trx.ref_block_num,
            "ref_block_prefix": trx.ref_block_prefix,
            "actions": actions,
        }))
    }

    fn action_to_variant(
        &self,
        action: &Action,
        resolver: &mut dyn AbiResolver,
        deadline: Instant,
    ) -> Result<Value, DecodeError> {
        self.check_deadline(deadline)?;
        let mut out = Map::new();
        out.insert("account".into(), json!(action.account.to_string()));
        out.insert("name".into(), json!(action.name.to_string()));
        out.insert("authorization".into(), serde_json::to_value(&action.authorization)?);

        let hex_payload = hex::encode(&action.data);
        match resolver.resolve(&action.account) {
            Some(abi) => match self.decode_action_data(&abi, action, deadline) {
                Ok(decoded) => {
                    out.insert("data".into(), decoded);
                    out.insert("hex_data".into(), json!(hex_payload));
                }
                Err(err @ DecodeError::DeadlineExceeded { .. }) => return Err(err),
                Err(err) => {
                    tracing::debug!(
                        account = %action.account,
                        action = %action.name,
                        error = %err,
                        "action payload does not decode against its ABI; keeping hex"
                    );
                    out.insert("data".into(), json!(hex_payload));
                }
            },
            None => {
                out.insert("data".into(), json!(hex_payload));
            }
        }
        Ok(Value::Object(out))
    }

    fn decode_action_data(
        &self,
        abi: &AbiDef,
        action: &Action,
        deadline: Instant,
    ) -> Result<Value, DecodeError> {
        let type_name = abi
            .action_type(&action.name)
            .ok_or_else(|| DecodeError::UnknownType {
                name: action.name.to_string(),
            })?;
        let mut reader = ByteReader::new(&action.data);
        let value = self.decode_value(&mut reader, abi, type_name, 0, deadline)?;
        reader.expect_end()?;
        Ok(value)
    }

    fn check_deadline(&self, deadline: Instant) -> Result<(), DecodeError> {
        if Instant::now() >= deadline {
            return Err(DecodeError::DeadlineExceeded {
                ms: self.max_decode_time.as_millis() as u64,
            });
        }
        Ok(())
    }

    fn decode_value(
        &self,
        reader: &mut ByteReader<'_>,
        abi: &AbiDef,
        type_name: &str,
        depth: usize,
        deadline: Instant,
    ) -> Result<Value, DecodeError> {
        self.check_deadline(deadline)?;
        if depth > MAX_DECODE_DEPTH {
            return Err(DecodeError::RecursionLimit { name: type_name.to_string() });
        }
        let resolved = abi.resolve_type(type_name);

        if let Some(elem) = resolved.strip_suffix("[]") {
            let count = reader.read_varuint32()? as usize;
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                items.push(self.decode_value(reader, abi, elem, depth + 1, deadline)?);
            }
            return Ok(Value::Array(items));
        }
        if let Some(inner) = resolved.strip_suffix('?') {
            return if reader.read_bool()? {
                self.decode_value(reader, abi, inner, depth + 1, deadline)
            } else {
                Ok(Value::Null)
            };
        }

        match resolved {
            "bool" => Ok(json!(reader.read_bool()?)),
            "uint8" => Ok(json!(reader.read_u8()?)),
            "uint16" => Ok(json!(reader.read_u16()?)),
            "uint32" => Ok(json!(reader.read_u32()?)),
            "uint64" => Ok(json!(reader.read_u64()?)),
            "int8" => Ok(json!(reader.read_i8()?)),
            "int16" => Ok(json!(reader.read_i16()?)),
            "int32" => Ok(json!(reader.read_i32()?)),
            "int64" => Ok(json!(reader.read_i64()?)),
            "varuint32" => Ok(json!(reader.read_varuint32()?)),
            "name" => Ok(json!(reader.read_name()?.to_string())),
            "asset" => Ok(json!(reader.read_asset()?.to_string())),
            "symbol" => Ok(json!(reader.read_symbol()?.to_string())),
            "string" => Ok(json!(reader.read_string()?)),
            "bytes" => Ok(json!(hex::encode(reader.read_bytes()?))),
            "checksum256" => Ok(json!(hex::encode(reader.read_checksum256()?))),
            "time_point_sec" => Ok(json!(reader.read_time_point_sec()?.to_string())),
            other => match abi.struct_def(other) {
                Some(def) => {
                    let fields = self.decode_struct(reader, abi, def, depth + 1, deadline)?;
                    Ok(Value::Object(fields))
                }
                None => Err(DecodeError::UnknownType { name: other.to_string() }),
            },
        }
    }

    /// Base struct fields decode first, in declaration order, then the
    /// struct's own fields.
    fn decode_struct(
        &self,
        reader: &mut ByteReader<'_>,
        abi: &AbiDef,
        def: &AbiStructDef,
        depth: usize,
        deadline: Instant,
    ) -> Result<Map<String, Value>, DecodeError> {
        self.check_deadline(deadline)?;
        if depth > MAX_DECODE_DEPTH {
            return Err(DecodeError::RecursionLimit { name: def.name.clone() });
        }
        let mut fields = Map::new();
        if !def.base.is_empty() {
            let base_name = abi.resolve_type(&def.base);
            let base = abi
                .struct_def(base_name)
                .ok_or_else(|| DecodeError::UnknownType { name: base_name.to_string() })?;
            fields = self.decode_struct(reader, abi, base, depth + 1, deadline)?;
        }
        for field in &def.fields {
            let value = self.decode_value(reader, abi, &field.type_name, depth + 1, deadline)?;
            fields.insert(field.name.clone(), value);
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Asset, Symbol};
    use crate::codec::ByteWriter;
    use crate::types::{PermissionLevel, TimePointSec};

    fn token_abi() -> AbiDef {
        AbiDef::from_json(
            r#"{
                "version": "eosio::abi/1.1",
                "types": [
                    { "new_type_name": "account_name", "type": "name" }
                ],
                "structs": [
                    {
                        "name": "transfer",
                        "base": "",
                        "fields": [
                            { "name": "from", "type": "account_name" },
                            { "name": "to", "type": "account_name" },
                            { "name": "quantity", "type": "asset" },
                            { "name": "memo", "type": "string" }
                        ]
                    }
                ],
                "actions": [
                    { "name": "transfer", "type": "transfer" }
                ]
            }"#,
        )
        .unwrap()
    }

    fn transfer_payload() -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_name("alice".parse().unwrap());
        w.write_name("bob".parse().unwrap());
        w.write_asset(Asset::new(10_000, Symbol::new(4, "SYS").unwrap()));
        w.write_string("rent");
        w.into_bytes().to_vec()
    }

    fn transfer_transaction(data: Vec<u8>) -> Transaction {
        Transaction {
            expiration: TimePointSec(1_700_000_000),
            ref_block_num: 7,
            ref_block_prefix: 99,
            actions: vec![Action {
                account: "eosio.token".parse().unwrap(),
                name: "transfer".parse().unwrap(),
                authorization: vec![PermissionLevel {
                    actor: "alice".parse().unwrap(),
                    permission: "active".parse().unwrap(),
                }],
                data: data.into(),
            }],
        }
    }

    fn decoder() -> AbiDecoder {
        AbiDecoder::new(Duration::from_millis(100))
    }

    #[test]
    fn decodes_known_action_payload() {
        let mut resolver =
            MapResolver::new().with_abi("eosio.token".parse().unwrap(), token_abi());
        let trx = transfer_transaction(transfer_payload());
        let value = decoder().transaction_to_variant(&trx, &mut resolver).unwrap();

        let action = &value["actions"][0];
        assert_eq!(action["account"], "eosio.token");
        assert_eq!(action["data"]["from"], "alice");
        assert_eq!(action["data"]["to"], "bob");
        assert_eq!(action["data"]["quantity"], "1.0000 SYS");
        assert_eq!(action["data"]["memo"], "rent");
        assert_eq!(action["hex_data"], hex::encode(transfer_payload()));
        assert_eq!(action["authorization"][0]["actor"], "alice");
    }

    #[test]
    fn unknown_account_degrades_to_hex() {
        let mut resolver = MapResolver::new();
        let trx = transfer_transaction(transfer_payload());
        let value = decoder().transaction_to_variant(&trx, &mut resolver).unwrap();

        let action = &value["actions"][0];
        assert_eq!(action["data"], hex::encode(transfer_payload()));
        assert!(action.get("hex_data").is_none());
    }

    #[test]
    fn malformed_payload_degrades_to_hex() {
        let mut resolver =
            MapResolver::new().with_abi("eosio.token".parse().unwrap(), token_abi());
        let mut payload = transfer_payload();
        payload.truncate(payload.len() - 3);
        let trx = transfer_transaction(payload.clone());
        let value = decoder().transaction_to_variant(&trx, &mut resolver).unwrap();

        assert_eq!(value["actions"][0]["data"], hex::encode(payload));
    }

    #[test]
    fn zero_budget_exceeds_deadline() {
        let mut resolver =
            MapResolver::new().with_abi("eosio.token".parse().unwrap(), token_abi());
        let trx = transfer_transaction(transfer_payload());
        let result =
            AbiDecoder::new(Duration::ZERO).transaction_to_variant(&trx, &mut resolver);
        assert!(matches!(result, Err(DecodeError::DeadlineExceeded { .. })));
    }

    #[test]
    fn decode_is_idempotent() {
        let mut resolver =
            MapResolver::new().with_abi("eosio.token".parse().unwrap(), token_abi());
        let trx = transfer_transaction(transfer_payload());
        let d = decoder();
        let first = d.transaction_to_variant(&trx, &mut resolver).unwrap();
        let second = d.transaction_to_variant(&trx, &mut resolver).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn arrays_and_optionals_decode() {
        let abi = AbiDef::from_json(
            r#"{
                "structs": [
                    {
                        "name": "settle",
                        "fields": [
                            { "name": "ids", "type": "uint32[]" },
                            { "name": "note", "type": "string?" }
                        ]
                    }
                ],
                "actions": [{ "name": "settle", "type": "settle" }]
            }"#,
        )
        .unwrap();
        let mut w = ByteWriter::new();
        w.write_varuint32(2);
        w.write_u32(7);
        w.write_u32(9);
        w.write_bool(false);
        let mut trx = transfer_transaction(w.into_bytes().to_vec());
        trx.actions[0].account = "settler".parse().unwrap();
        trx.actions[0].name = "settle".parse().unwrap();

        let mut resolver = MapResolver::new().with_abi("settler".parse().unwrap(), abi);
        let value = decoder().transaction_to_variant(&trx, &mut resolver).unwrap();
        assert_eq!(value["actions"][0]["data"]["ids"], json!([7, 9]));
        assert_eq!(value["actions"][0]["data"]["note"], Value::Null);
    }
}
