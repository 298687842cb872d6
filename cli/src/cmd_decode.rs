//! `chainrelay decode` decodes one packed transaction against an ABI file,
//! without a running relay or sink.

use anyhow::{Context, Result};
use chainrelay_core::{AbiDecoder, AbiDef, AccountName, MapResolver, PackedTransaction};
use std::path::Path;
use std::time::Duration;

/// Offline decode budget. Much looser than the relay default: nothing
/// here blocks a node thread.
const DECODE_BUDGET: Duration = Duration::from_millis(250);

pub fn run(abi_path: &str, account: &str, trx_hex: &str) -> Result<()> {
    let abi = AbiDef::from_file(Path::new(abi_path))
        .with_context(|| format!("loading ABI from {abi_path}"))?;
    let account: AccountName = account
        .parse()
        .with_context(|| format!("invalid account name '{account}'"))?;

    let raw = hex::decode(trx_hex.trim()).context("transaction hex is malformed")?;
    let packed = PackedTransaction::new(raw);
    let id = packed.id();
    let trx = packed.unpack().context("unpacking transaction envelope")?;

    let mut resolver = MapResolver::new().with_abi(account, abi);
    let decoder = AbiDecoder::new(DECODE_BUDGET);
    let value = decoder
        .transaction_to_variant(&trx, &mut resolver)
        .context("decoding transaction")?;

    println!("id: {id}");
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
