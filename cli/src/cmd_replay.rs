//! `chainrelay replay` feeds a captured event log through the pipeline.
//!
//! Event file format (JSON array, one entry per host callback):
//! ```json
//! [
//!   {"type": "accepted_transaction", "id": "<hex>", "packed": {"raw": "<hex>"}},
//!   {"type": "applied_transaction", "id": "<hex>", "block_num": 12,
//!    "elapsed_us": 180, "net_usage_words": 16},
//!   {"type": "accepted_block", "block_num": 12,
//!    "timestamp": "2023-11-14T22:13:20", "producer": "eosio",
//!    "transactions": [...]},
//!   {"type": "irreversible_block", "block_num": 12, ...}
//! ]
//! ```

use anyhow::{Context, Result};
use chainrelay_core::{SignedBlock, TransactionMetadata, TransactionTrace};
use chainrelay_pipeline::{RelayConfig, RelayPlugin};
use serde::Deserialize;
use std::sync::Arc;

/// One captured host callback, tagged by which signal delivered it.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RecordedEvent {
    AcceptedTransaction(TransactionMetadata),
    AppliedTransaction(TransactionTrace),
    AcceptedBlock(SignedBlock),
    IrreversibleBlock(SignedBlock),
}

pub fn run(config_path: Option<&str>, events_path: &str) -> Result<()> {
    let config: RelayConfig = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {path}"))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing config file {path}"))?
        }
        None => RelayConfig::default(),
    };

    let content = std::fs::read_to_string(events_path)
        .with_context(|| format!("reading events file {events_path}"))?;
    let events: Vec<RecordedEvent> = serde_json::from_str(&content)
        .with_context(|| format!("parsing events file {events_path}"))?;

    let mut plugin = RelayPlugin::new(config).context("starting relay")?;
    if !plugin.is_active() {
        println!("note: no sink address configured, replayed events are dropped");
    }

    let total = events.len();
    for event in events {
        match event {
            RecordedEvent::AcceptedTransaction(meta) => {
                plugin.on_accepted_transaction(Arc::new(meta));
            }
            RecordedEvent::AppliedTransaction(trace) => {
                plugin.on_applied_transaction(Arc::new(trace));
            }
            RecordedEvent::AcceptedBlock(block) => {
                plugin.on_accepted_block(Arc::new(block));
            }
            RecordedEvent::IrreversibleBlock(block) => {
                plugin.on_irreversible_block(Arc::new(block));
            }
        }
    }
    plugin.shutdown();

    let metrics = plugin.metrics();
    println!("Replayed {total} events");
    println!("  traces processed:        {}", metrics.traces_processed);
    println!("  transactions processed:  {}", metrics.transactions_processed);
    println!("  blocks processed:        {}", metrics.blocks_processed);
    println!("  irreversible processed:  {}", metrics.irreversible_processed);
    println!("  blocks forwarded:        {}", metrics.blocks_forwarded);
    println!("  transactions forwarded:  {}", metrics.transactions_forwarded);
    println!("  decode errors:           {}", metrics.decode_errors);
    println!("  sink errors:             {}", metrics.sink_errors);
    Ok(())
}
