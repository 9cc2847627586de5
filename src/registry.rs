//! AnalyzerRegistry — the immutable-after-init table of analyzer descriptors
//! and their mutable runtime state.
//!
//! Membership is fixed once [`AnalyzerRegistry::new`] returns. Every mutable
//! field on an individual analyzer lives behind an atomic, so reads never
//! block and writers never contend with each other across analyzers. See
//! spec §9 ("Shared mutable state without ambient locks").

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use crate::config::AnalyzerSpec;

/// Immutable analyzer descriptor (id, endpoint, weight).
#[derive(Debug, Clone)]
pub struct AnalyzerDescriptor {
    pub id: String,
    pub endpoint: String,
    pub weight: f64,
}

/// Mutable runtime state for a single analyzer. All fields are atomic so
/// the selector (reader), dispatch workers (writers on success/failure),
/// and the recovery sweeper (writer on promotion) never need a lock.
#[derive(Debug, Default)]
pub struct AnalyzerRuntime {
    /// Messages successfully delivered, ever. Monotonically non-decreasing.
    message_count: AtomicU64,
    /// Consecutive failed sends since the last success or recovery.
    consecutive_failures: AtomicU32,
    /// Milliseconds since the registry's epoch at the most recent failure.
    /// 0 means "no failure has ever been recorded".
    last_failure_millis: AtomicU64,
    /// Health state: true = Online, false = Offline.
    online: AtomicBool,
}

impl AnalyzerRuntime {
    fn new() -> Self {
        Self {
            message_count: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            last_failure_millis: AtomicU64::new(0),
            online: AtomicBool::new(true),
        }
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Acquire)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn last_failure_millis(&self) -> u64 {
        self.last_failure_millis.load(Ordering::Acquire)
    }

    /// Add `delivered` messages to this analyzer's count. Returns the new
    /// total so callers can fold it into `totalMessagesProcessed` without a
    /// second atomic read racing against other workers.
    pub(crate) fn add_messages(&self, delivered: u64) -> u64 {
        self.message_count.fetch_add(delivered, Ordering::AcqRel) + delivered
    }

    pub(crate) fn reset_failures(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
    }

    pub(crate) fn bump_failures(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn set_last_failure_millis(&self, now_millis: u64) {
        self.last_failure_millis.store(now_millis, Ordering::Release);
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

/// Point-in-time view of one analyzer, returned by
/// [`AnalyzerRegistry::snapshot`]. Fields are read independently and are not
/// guaranteed to be mutually consistent (spec §4.1).
#[derive(Debug, Clone)]
pub struct AnalyzerView {
    pub index: usize,
    pub id: String,
    pub weight: f64,
    pub message_count: u64,
    pub online: bool,
}

/// The fixed table of analyzers for the process lifetime.
pub struct AnalyzerRegistry {
    descriptors: Vec<AnalyzerDescriptor>,
    runtime: Vec<AnalyzerRuntime>,
    by_id: HashMap<String, usize>,
    epoch: Instant,
}

impl AnalyzerRegistry {
    /// Build a registry from configuration specs, in the order given —
    /// that order is the stable iteration order used for Phase-A tie-breaks
    /// in the selector (spec §4.3).
    pub fn new(specs: Vec<AnalyzerSpec>) -> Self {
        let mut by_id = HashMap::with_capacity(specs.len());
        let mut descriptors = Vec::with_capacity(specs.len());
        let mut runtime = Vec::with_capacity(specs.len());

        for (index, spec) in specs.into_iter().enumerate() {
            by_id.insert(spec.id.clone(), index);
            descriptors.push(AnalyzerDescriptor {
                id: spec.id,
                endpoint: spec.endpoint,
                weight: spec.weight,
            });
            runtime.push(AnalyzerRuntime::new());
        }

        Self {
            descriptors,
            runtime,
            by_id,
            epoch: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, index: usize) -> &AnalyzerDescriptor {
        &self.descriptors[index]
    }

    pub fn runtime(&self, index: usize) -> &AnalyzerRuntime {
        &self.runtime[index]
    }

    pub fn index_for_id(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Milliseconds elapsed since the registry was created — the clock the
    /// health machinery (`lastFailureTime`, the sweeper's cooldown check)
    /// is measured against. Monotonic, immune to wall-clock adjustment.
    pub fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// A non-blocking, possibly-inconsistent-across-analyzers read of every
    /// analyzer's current state (spec §4.1).
    pub fn snapshot(&self) -> Vec<AnalyzerView> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(index, d)| AnalyzerView {
                index,
                id: d.id.clone(),
                weight: d.weight,
                message_count: self.runtime[index].message_count(),
                online: self.runtime[index].is_online(),
            })
            .collect()
    }

    pub fn iter_indices(&self) -> std::ops::Range<usize> {
        0..self.descriptors.len()
    }
}
