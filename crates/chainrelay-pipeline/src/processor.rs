//! Per-kind event processing on the consumer thread.
//!
//! Only irreversible blocks are forwarded today: each packed receipt is
//! unpacked, decoded against the ABI cache, and accumulated into one
//! block request. The other three processors validate and serialize their
//! events as hook points for later forwarding. Failures are contained per
//! event: a bad receipt never takes down its block, and nothing here
//! terminates the consumer.

use crate::consumer::RelayMetrics;
use chainrelay_core::cache::AbiCache;
use chainrelay_core::decoder::AbiDecoder;
use chainrelay_core::types::{
    ReceiptTransaction, SignedBlock, TransactionMetadata, TransactionTrace,
};
use chainrelay_sink::{BlockTransaction, EventSink};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// Owns the ABI cache and decoder; moved into the consumer thread, so the
/// cache has exactly one writer.
pub struct EventProcessor {
    decoder: AbiDecoder,
    cache: AbiCache,
    sink: Arc<dyn EventSink>,
    runtime: tokio::runtime::Handle,
    metrics: Arc<Mutex<RelayMetrics>>,
}

impl EventProcessor {
    pub fn new(
        decoder: AbiDecoder,
        cache: AbiCache,
        sink: Arc<dyn EventSink>,
        runtime: tokio::runtime::Handle,
        metrics: Arc<Mutex<RelayMetrics>>,
    ) -> Self {
        Self { decoder, cache, sink, runtime, metrics }
    }

    /// Applied traces are serialized for observability only; nothing is
    /// forwarded for them yet.
    pub fn process_applied_transaction(&mut self, trace: &Arc<TransactionTrace>) {
        self.metrics.lock().unwrap().traces_processed += 1;
        match serde_json::to_string(trace.as_ref()) {
            Ok(json) => debug!(
                trx_id = %trace.id,
                block_num = trace.block_num,
                trace = %json,
                "applied transaction trace"
            ),
            Err(err) => error!(trx_id = %trace.id, error = %err, "trace does not serialize"),
        }
    }

    /// Accepted transactions are unpacked to validate the wire payload;
    /// nothing is forwarded for them yet.
    pub fn process_accepted_transaction(&mut self, meta: &Arc<TransactionMetadata>) {
        self.metrics.lock().unwrap().transactions_processed += 1;
        match meta.packed.unpack() {
            Ok(trx) => debug!(
                trx_id = %meta.id,
                actions = trx.actions.len(),
                "accepted transaction"
            ),
            Err(err) => {
                self.metrics.lock().unwrap().decode_errors += 1;
                error!(trx_id = %meta.id, error = %err, "accepted transaction does not unpack");
            }
        }
    }

    pub fn process_accepted_block(&mut self, block: &Arc<SignedBlock>) {
        self.metrics.lock().unwrap().blocks_processed += 1;
        debug!(
            block_num = block.block_num,
            producer = %block.producer,
            receipts = block.transactions.len(),
            "accepted block"
        );
    }

    /// Decode every packed receipt of an irreversible block and forward
    /// them as one block request. Pruned (id-only) receipts are skipped;
    /// a block with no packed receipts produces no sink call.
    pub fn process_irreversible_block(&mut self, block: &Arc<SignedBlock>) {
        self.metrics.lock().unwrap().irreversible_processed += 1;
        let mut records = Vec::new();
        for receipt in &block.transactions {
            let packed = match &receipt.trx {
                ReceiptTransaction::Packed(packed) => packed,
                ReceiptTransaction::Id(_) => continue,
            };
            let trx_id = packed.id();
            let trx = match packed.unpack() {
                Ok(trx) => trx,
                Err(err) => {
                    self.metrics.lock().unwrap().decode_errors += 1;
                    error!(
                        block_num = block.block_num,
                        trx_id = %trx_id,
                        error = %err,
                        "skipping packed transaction that does not unpack"
                    );
                    continue;
                }
            };
            match self.decoder.transaction_to_variant(&trx, &mut self.cache) {
                Ok(value) => records.push(BlockTransaction {
                    trx: value.to_string(),
                    trx_id: trx_id.to_string(),
                }),
                Err(err) => {
                    self.metrics.lock().unwrap().decode_errors += 1;
                    error!(
                        block_num = block.block_num,
                        trx_id = %trx_id,
                        error = %err,
                        "skipping transaction that does not decode"
                    );
                }
            }
        }

        if records.is_empty() {
            return;
        }
        let count = records.len();
        match self
            .runtime
            .block_on(self.sink.send_block(block.block_num, records))
        {
            Ok(reply) => {
                let mut metrics = self.metrics.lock().unwrap();
                metrics.blocks_forwarded += 1;
                metrics.transactions_forwarded += count as u64;
                debug!(
                    block_num = block.block_num,
                    transactions = count,
                    reply = %reply,
                    "forwarded irreversible block"
                );
            }
            Err(err) => {
                self.metrics.lock().unwrap().sink_errors += 1;
                error!(
                    block_num = block.block_num,
                    error = %err,
                    "failed to forward irreversible block"
                );
            }
        }
    }
}
