//! Process-wide telemetry counters (spec §3 "Global counters", §8 P2/P3).
//!
//! Every field is an independent atomic; readers tolerate mild staleness
//! between `total_messages_processed` and the sum of per-analyzer counts
//! during concurrent updates (spec §5 "Ordering guarantees").

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counters {
    pub packets_received: AtomicU64,
    pub packets_queued: AtomicU64,
    pub packets_processed: AtomicU64,
    pub packets_dropped: AtomicU64,
    total_messages_processed: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_messages_processed(&self) -> u64 {
        self.total_messages_processed.load(Ordering::Acquire)
    }

    pub(crate) fn add_total_messages(&self, delta: u64) -> u64 {
        self.total_messages_processed.fetch_add(delta, Ordering::AcqRel) + delta
    }

    pub fn received(&self) -> u64 {
        self.packets_received.load(Ordering::Acquire)
    }

    pub fn queued(&self) -> u64 {
        self.packets_queued.load(Ordering::Acquire)
    }

    pub fn processed(&self) -> u64 {
        self.packets_processed.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.packets_dropped.load(Ordering::Acquire)
    }

    pub fn record_received(&self) {
        self.packets_received.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_queued(&self) {
        self.packets_queued.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_processed(&self) {
        self.packets_processed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CountersSnapshot {
    pub packets_received: u64,
    pub packets_queued: u64,
    pub packets_processed: u64,
    pub packets_dropped: u64,
    pub total_messages_processed: u64,
}

impl From<&Counters> for CountersSnapshot {
    fn from(c: &Counters) -> Self {
        Self {
            packets_received: c.received(),
            packets_queued: c.queued(),
            packets_processed: c.processed(),
            packets_dropped: c.dropped(),
            total_messages_processed: c.total_messages_processed(),
        }
    }
}
