//! The background consumer: one named thread draining all queues.

use crate::processor::EventProcessor;
use crate::queue::EventQueues;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{error, info};

/// Metrics snapshot for one relay instance.
#[derive(Debug, Clone, Default)]
pub struct RelayMetrics {
    pub events_enqueued: u64,
    pub traces_processed: u64,
    pub transactions_processed: u64,
    pub blocks_processed: u64,
    pub irreversible_processed: u64,
    pub decode_errors: u64,
    pub sink_errors: u64,
    pub blocks_forwarded: u64,
    pub transactions_forwarded: u64,
}

/// Owns the consumer thread and the queues it drains.
#[derive(Debug)]
pub struct RelayEngine {
    queues: Arc<EventQueues>,
    metrics: Arc<Mutex<RelayMetrics>>,
    consumer: Option<thread::JoinHandle<()>>,
}

impl RelayEngine {
    /// Spawn the consumer thread. `metrics` is shared with the processor
    /// and with callers wanting snapshots.
    pub fn start(
        queues: Arc<EventQueues>,
        processor: EventProcessor,
        metrics: Arc<Mutex<RelayMetrics>>,
    ) -> std::io::Result<Self> {
        let thread_queues = Arc::clone(&queues);
        let consumer = thread::Builder::new()
            .name("chainrelay-consume".to_string())
            .spawn(move || consume_loop(thread_queues, processor))?;
        Ok(Self { queues, metrics, consumer: Some(consumer) })
    }

    pub fn queues(&self) -> &Arc<EventQueues> {
        &self.queues
    }

    pub fn note_enqueued(&self) {
        self.metrics.lock().unwrap().events_enqueued += 1;
    }

    /// Returns a snapshot of current metrics.
    pub fn metrics(&self) -> RelayMetrics {
        self.metrics.lock().unwrap().clone()
    }

    /// Flag shutdown and wait for the consumer to finish draining.
    /// Idempotent; a join failure is logged rather than re-raised.
    pub fn shutdown(&mut self) {
        let Some(consumer) = self.consumer.take() else { return };
        self.queues.request_shutdown();
        if consumer.join().is_err() {
            error!("relay consumer thread panicked during shutdown");
        }
    }
}

impl Drop for RelayEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drain cycles run until shutdown is flagged and a cycle finds all
/// queues empty, so events enqueued during shutdown are still processed.
/// Buffers are processed in fixed priority order: applied traces first,
/// then accepted transactions, accepted blocks, and irreversible blocks.
fn consume_loop(queues: Arc<EventQueues>, mut processor: EventProcessor) {
    info!("relay consumer started");
    loop {
        let drained = queues.wait_and_drain();
        if drained.shutting_down && !drained.is_empty() {
            info!(pending = drained.total(), "draining remaining events before shutdown");
        }
        for trace in &drained.applied_transactions {
            processor.process_applied_transaction(trace);
        }
        for meta in &drained.accepted_transactions {
            processor.process_accepted_transaction(meta);
        }
        for block in &drained.accepted_blocks {
            processor.process_accepted_block(block);
        }
        for block in &drained.irreversible_blocks {
            processor.process_irreversible_block(block);
        }
        if drained.shutting_down && drained.is_empty() {
            break;
        }
    }
    info!("relay consumer shut down gracefully");
}
