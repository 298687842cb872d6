//! Bounded event queues with adaptive producer throttling.
//!
//! Four FIFO buffers share one mutex, one condition variable, and one
//! throttle delay. An enqueue never drops: when the target queue is over
//! its soft capacity the producer is put to sleep for the current delay
//! (which grows by one step per throttled enqueue, up to a ceiling, and
//! decays by one step whenever the queue is back within bounds), then the
//! event is appended regardless. Every insertion signals the consumer.

use chainrelay_core::types::{SignedBlock, TransactionMetadata, TransactionTrace};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::warn;

/// Capacity and throttle parameters, shared by all four queues.
#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    pub max_queue_size: usize,
    pub throttle_step: Duration,
    pub throttle_ceiling: Duration,
    pub throttle_warn: Duration,
}

#[derive(Debug, Default)]
struct QueueSet {
    applied_transactions: VecDeque<Arc<TransactionTrace>>,
    accepted_transactions: VecDeque<Arc<TransactionMetadata>>,
    accepted_blocks: VecDeque<Arc<SignedBlock>>,
    irreversible_blocks: VecDeque<Arc<SignedBlock>>,
    shutdown: bool,
}

impl QueueSet {
    fn total(&self) -> usize {
        self.applied_transactions.len()
            + self.accepted_transactions.len()
            + self.accepted_blocks.len()
            + self.irreversible_blocks.len()
    }

    fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Everything the consumer pulled out in one atomic swap, in FIFO order
/// per buffer, plus whether shutdown was flagged at swap time.
#[derive(Debug, Default)]
pub struct DrainedEvents {
    pub applied_transactions: Vec<Arc<TransactionTrace>>,
    pub accepted_transactions: Vec<Arc<TransactionMetadata>>,
    pub accepted_blocks: Vec<Arc<SignedBlock>>,
    pub irreversible_blocks: Vec<Arc<SignedBlock>>,
    pub shutting_down: bool,
}

impl DrainedEvents {
    pub fn total(&self) -> usize {
        self.applied_transactions.len()
            + self.accepted_transactions.len()
            + self.accepted_blocks.len()
            + self.irreversible_blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The shared producer/consumer buffer set.
#[derive(Debug)]
pub struct EventQueues {
    inner: Mutex<QueueSet>,
    wake: Condvar,
    // Millisecond delay currently imposed on overloaded producers. Plain
    // atomic: it is advisory and read outside the queue lock.
    throttle_ms: AtomicU64,
    settings: QueueSettings,
}

impl EventQueues {
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            inner: Mutex::new(QueueSet::default()),
            wake: Condvar::new(),
            throttle_ms: AtomicU64::new(0),
            settings,
        }
    }

    pub fn push_applied_transaction(&self, trace: Arc<TransactionTrace>) {
        self.push(|q| &mut q.applied_transactions, trace);
    }

    pub fn push_accepted_transaction(&self, meta: Arc<TransactionMetadata>) {
        self.push(|q| &mut q.accepted_transactions, meta);
    }

    pub fn push_accepted_block(&self, block: Arc<SignedBlock>) {
        self.push(|q| &mut q.accepted_blocks, block);
    }

    pub fn push_irreversible_block(&self, block: Arc<SignedBlock>) {
        self.push(|q| &mut q.irreversible_blocks, block);
    }

    /// The enqueue path. When the target queue is over capacity the lock
    /// is released first so neither the consumer nor other producers stall
    /// behind the sleeping thread; the event is appended after the delay.
    fn push<T>(&self, select: impl Fn(&mut QueueSet) -> &mut VecDeque<T>, event: T) {
        let mut guard = self.inner.lock().unwrap();
        let size_now = select(&mut guard).len();
        if size_now > self.settings.max_queue_size {
            drop(guard);
            self.wake.notify_one();
            let delay = self.grow_throttle();
            if delay > self.settings.throttle_warn {
                warn!(
                    queue_size = size_now,
                    delay_ms = delay.as_millis() as u64,
                    "event queue over capacity; slowing producer"
                );
            }
            std::thread::sleep(delay);
            guard = self.inner.lock().unwrap();
        } else {
            self.decay_throttle();
        }
        select(&mut guard).push_back(event);
        drop(guard);
        self.wake.notify_one();
    }

    fn grow_throttle(&self) -> Duration {
        let step = self.settings.throttle_step.as_millis() as u64;
        let ceiling = self.settings.throttle_ceiling.as_millis() as u64;
        let prev = self
            .throttle_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |ms| {
                Some((ms + step).min(ceiling))
            })
            .unwrap_or_else(|ms| ms);
        Duration::from_millis((prev + step).min(ceiling))
    }

    fn decay_throttle(&self) {
        let step = self.settings.throttle_step.as_millis() as u64;
        let _ = self
            .throttle_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |ms| {
                Some(ms.saturating_sub(step))
            });
    }

    /// Block until any queue holds an event or shutdown is requested, then
    /// move every buffer's full contents out under one lock acquisition.
    pub fn wait_and_drain(&self) -> DrainedEvents {
        let mut guard = self.inner.lock().unwrap();
        while guard.is_empty() && !guard.shutdown {
            guard = self.wake.wait(guard).unwrap();
        }
        DrainedEvents {
            applied_transactions: guard.applied_transactions.drain(..).collect(),
            accepted_transactions: guard.accepted_transactions.drain(..).collect(),
            accepted_blocks: guard.accepted_blocks.drain(..).collect(),
            irreversible_blocks: guard.irreversible_blocks.drain(..).collect(),
            shutting_down: guard.shutdown,
        }
    }

    /// Flag shutdown and wake the consumer. Events already queued (or
    /// still being pushed) will be drained before the consumer exits.
    pub fn request_shutdown(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.shutdown = true;
        drop(guard);
        self.wake.notify_one();
    }

    /// Current producer delay. Zero when the pipeline keeps up.
    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_ms.load(Ordering::Relaxed))
    }

    pub fn total_queued(&self) -> usize {
        self.inner.lock().unwrap().total()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainrelay_core::types::{PackedTransaction, TransactionId};

    fn settings(max_queue_size: usize) -> QueueSettings {
        QueueSettings {
            max_queue_size,
            throttle_step: Duration::from_millis(1),
            throttle_ceiling: Duration::from_millis(5),
            throttle_warn: Duration::from_millis(1_000),
        }
    }

    fn meta(tag: u8) -> Arc<TransactionMetadata> {
        let packed = PackedTransaction::new(vec![tag]);
        Arc::new(TransactionMetadata { id: packed.id(), packed })
    }

    #[test]
    fn fifo_order_is_preserved() {
        let queues = EventQueues::new(settings(512));
        let expected: Vec<TransactionId> = (0..10)
            .map(|i| {
                let m = meta(i);
                let id = m.id;
                queues.push_accepted_transaction(m);
                id
            })
            .collect();
        let drained = queues.wait_and_drain();
        let got: Vec<TransactionId> =
            drained.accepted_transactions.iter().map(|m| m.id).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn drain_empties_every_queue() {
        let queues = EventQueues::new(settings(512));
        queues.push_accepted_transaction(meta(1));
        queues.push_accepted_transaction(meta(2));
        assert_eq!(queues.total_queued(), 2);
        let drained = queues.wait_and_drain();
        assert_eq!(drained.total(), 2);
        assert!(queues.is_empty());
        assert!(!drained.shutting_down);
    }

    #[test]
    fn throttle_grows_past_capacity_and_caps_at_ceiling() {
        let queues = EventQueues::new(settings(2));
        for i in 0..3 {
            queues.push_accepted_transaction(meta(i));
        }
        assert_eq!(queues.throttle_delay(), Duration::ZERO);

        // Queue already holds 3 > 2, so every further push is throttled.
        queues.push_accepted_transaction(meta(10));
        assert_eq!(queues.throttle_delay(), Duration::from_millis(1));
        queues.push_accepted_transaction(meta(11));
        assert_eq!(queues.throttle_delay(), Duration::from_millis(2));

        for i in 0..10 {
            queues.push_accepted_transaction(meta(20 + i));
        }
        assert_eq!(queues.throttle_delay(), Duration::from_millis(5));
    }

    #[test]
    fn throttle_decays_once_within_bounds() {
        let queues = EventQueues::new(settings(1));
        for i in 0..5 {
            queues.push_accepted_transaction(meta(i));
        }
        let inflated = queues.throttle_delay();
        assert!(inflated > Duration::ZERO);

        let _ = queues.wait_and_drain();
        queues.push_accepted_transaction(meta(99));
        assert_eq!(
            queues.throttle_delay(),
            inflated - Duration::from_millis(1)
        );
    }

    #[test]
    fn shutdown_wakes_an_idle_consumer() {
        let queues = Arc::new(EventQueues::new(settings(512)));
        let waiter = {
            let queues = Arc::clone(&queues);
            std::thread::spawn(move || queues.wait_and_drain())
        };
        // Give the consumer a moment to park on the condvar.
        std::thread::sleep(Duration::from_millis(20));
        queues.request_shutdown();
        let drained = waiter.join().unwrap();
        assert!(drained.shutting_down);
        assert!(drained.is_empty());
    }

    #[test]
    fn events_pushed_after_shutdown_are_still_drained() {
        let queues = EventQueues::new(settings(512));
        queues.request_shutdown();
        queues.push_accepted_transaction(meta(1));
        let drained = queues.wait_and_drain();
        assert!(drained.shutting_down);
        assert_eq!(drained.accepted_transactions.len(), 1);
    }
}
