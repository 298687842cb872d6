//! The relay plugin shell: lifecycle, ABI seeding, and the four inbound
//! host callbacks.
//!
//! The host integration layer constructs one `RelayPlugin` and wires its
//! callbacks to the node's event signals. Callbacks only enqueue (all
//! decode and sink work happens on the consumer thread) and never let a
//! panic or error escape to the host.

use crate::config::RelayConfig;
use crate::consumer::{RelayEngine, RelayMetrics};
use crate::error::RelayError;
use crate::processor::EventProcessor;
use crate::queue::EventQueues;
use chainrelay_core::abi::AbiDef;
use chainrelay_core::cache::AbiCache;
use chainrelay_core::decoder::AbiDecoder;
use chainrelay_core::name::AccountName;
use chainrelay_core::types::{SignedBlock, TransactionMetadata, TransactionTrace};
use chainrelay_sink::{EventSink, HttpSinkClient};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info};

/// ABIs loaded at startup. The cache is not populated from the chain:
/// accounts outside this set render their action payloads as raw hex.
const SEED_ABIS: [(&str, &str); 2] = [
    ("eosio.token", "eosio.token.abi"),
    ("eosio", "eosio.abi"),
];

/// Handshake payload confirming the sink is reachable before any event
/// flows.
const INIT_ACTION: (&str, &str) = ("init", "init--json");

/// One relay instance: queues, consumer thread, sink, and runtime.
#[derive(Debug)]
pub struct RelayPlugin {
    engine: Option<RelayEngine>,
    runtime: Option<tokio::runtime::Runtime>,
    metrics: Arc<Mutex<RelayMetrics>>,
}

impl RelayPlugin {
    /// Build and start a relay from configuration. Without a sink address
    /// the plugin is constructed inert: callbacks are accepted and do
    /// nothing, and no thread or runtime is created.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;
        let Some(address) = config.sink_address.clone() else {
            info!("no sink address configured; relay stays inert");
            return Ok(Self {
                engine: None,
                runtime: None,
                metrics: Arc::default(),
            });
        };
        let runtime = build_runtime()?;
        let sink: Arc<dyn EventSink> =
            Arc::new(HttpSinkClient::new(address, config.request_timeout()));
        Self::start(config, runtime, sink)
    }

    /// Build and start a relay around a caller-provided sink. Used by
    /// integration tests and custom transports; always active.
    pub fn with_sink(config: RelayConfig, sink: Arc<dyn EventSink>) -> Result<Self, RelayError> {
        config.validate()?;
        let runtime = build_runtime()?;
        Self::start(config, runtime, sink)
    }

    fn start(
        config: RelayConfig,
        runtime: tokio::runtime::Runtime,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, RelayError> {
        let reply = runtime
            .block_on(sink.send_action(INIT_ACTION.0, INIT_ACTION.1))
            .map_err(|source| RelayError::SinkHandshake { source })?;
        debug!(reply = %reply, "sink handshake complete");

        let mut cache = AbiCache::new(config.abi_cache_size);
        seed_abi_cache(&mut cache, &config)?;

        let metrics = Arc::new(Mutex::new(RelayMetrics::default()));
        let processor = EventProcessor::new(
            AbiDecoder::new(config.decode_budget()),
            cache,
            sink,
            runtime.handle().clone(),
            Arc::clone(&metrics),
        );
        let queues = Arc::new(EventQueues::new(config.queue_settings()));
        let engine = RelayEngine::start(queues, processor, Arc::clone(&metrics))?;
        info!(
            max_queue_size = config.max_queue_size,
            abi_cache_size = config.abi_cache_size,
            "chainrelay started"
        );
        Ok(Self { engine: Some(engine), runtime: Some(runtime), metrics })
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// Snapshot of this instance's counters. Valid before, during, and
    /// after shutdown.
    pub fn metrics(&self) -> RelayMetrics {
        self.metrics.lock().unwrap().clone()
    }

    pub fn on_accepted_transaction(&self, meta: Arc<TransactionMetadata>) {
        self.guard("accepted_transaction", |engine| {
            engine.queues().push_accepted_transaction(meta);
        });
    }

    pub fn on_applied_transaction(&self, trace: Arc<TransactionTrace>) {
        self.guard("applied_transaction", |engine| {
            engine.queues().push_applied_transaction(trace);
        });
    }

    pub fn on_accepted_block(&self, block: Arc<SignedBlock>) {
        self.guard("accepted_block", |engine| {
            engine.queues().push_accepted_block(block);
        });
    }

    pub fn on_irreversible_block(&self, block: Arc<SignedBlock>) {
        self.guard("irreversible_block", |engine| {
            engine.queues().push_irreversible_block(block);
        });
    }

    /// Host callback boundary: enqueue on the live engine, drop the event
    /// when inert, and never let a panic cross back into the host.
    fn guard(&self, callback: &str, enqueue: impl FnOnce(&RelayEngine)) {
        let Some(engine) = &self.engine else { return };
        match catch_unwind(AssertUnwindSafe(|| enqueue(engine))) {
            Ok(()) => engine.note_enqueued(),
            Err(_) => error!(callback, "panic caught at host callback boundary"),
        }
    }

    /// Stop accepting work and drain: flags shutdown, waits for the
    /// consumer to process everything still queued, then tears down the
    /// runtime. Idempotent, and also run by `Drop`.
    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            info!("chainrelay shutting down");
            engine.shutdown();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_secs(5));
        }
    }
}

impl Drop for RelayPlugin {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime, RelayError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn seed_abi_cache(cache: &mut AbiCache, config: &RelayConfig) -> Result<(), RelayError> {
    for (account, file) in SEED_ABIS {
        let path = config.abi_dir.join(file);
        let abi = AbiDef::from_file(&path).map_err(|source| RelayError::AbiSeed {
            account: account.to_string(),
            source,
        })?;
        let name: AccountName = account.parse().expect("seed account names are valid");
        info!(account, path = %path.display(), "seeded ABI");
        cache.insert(name, Arc::new(abi));
    }
    Ok(())
}
