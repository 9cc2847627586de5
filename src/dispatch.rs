//! DispatchPipeline — bounded queue + worker pool + HTTP client (spec §4.4).
//!
//! Carries `(packet, targetAnalyzer)` pairs from the ingest boundary to a
//! POST against the analyzer's endpoint, updating counters and health state
//! on completion. Enqueue never blocks beyond a bounded queue-insertion
//! attempt: when the queue is full this implementation applies
//! *caller-runs* backpressure (spec §4.4, §9) — the calling task performs
//! the send itself rather than the packet being silently lost.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::Tunables;
use crate::counters::Counters;
use crate::health;
use crate::packet::LogPacket;
use crate::registry::AnalyzerRegistry;

/// A unit of dispatch work: a packet and the analyzer index chosen for it.
struct DispatchJob {
    packet: LogPacket,
    target: usize,
}

#[derive(Debug, Error)]
enum SendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analyzer returned status {0}")]
    Status(StatusCode),
}

/// Outcome of [`DispatchPipeline::enqueue`], surfaced for observability and
/// testing; both variants have already been accounted for in the counters
/// by the time this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Handed to the bounded queue for a worker to pick up.
    Queued,
    /// The queue was full; the enqueueing task sent the packet itself.
    SentInline,
}

struct Workers {
    http: reqwest::Client,
    registry: Arc<AnalyzerRegistry>,
    counters: Arc<Counters>,
    tunables: Arc<Tunables>,
}

impl Workers {
    async fn send(&self, packet: &LogPacket, endpoint: &str) -> Result<(), SendError> {
        let response = self
            .http
            .post(endpoint)
            .json(packet)
            .timeout(self.tunables.request_timeout)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SendError::Status(response.status()))
        }
    }

    /// Deliver one job and reflect the outcome in counters and health
    /// state. Never panics or propagates — failures are local (spec §7).
    async fn process(&self, job: DispatchJob) {
        let endpoint = self.registry.descriptor(job.target).endpoint.clone();
        match self.send(&job.packet, &endpoint).await {
            Ok(()) => {
                let delivered = job.packet.message_count();
                self.registry.runtime(job.target).add_messages(delivered);
                self.counters.add_total_messages(delivered);
                health::record_success(&self.registry, job.target);
                self.counters.record_processed();
            }
            Err(e) => {
                warn!(
                    analyzer = %self.registry.descriptor(job.target).id,
                    packet_id = %job.packet.packet_id,
                    error = %e,
                    "delivery failed"
                );
                health::record_failure(&self.registry, job.target, &self.tunables);
                self.counters.record_dropped();
            }
        }
    }
}

/// Bounded work queue, worker pool, and HTTP client wired together.
pub struct DispatchPipeline {
    sender: mpsc::Sender<DispatchJob>,
    workers: Workers,
}

impl DispatchPipeline {
    /// Build the pipeline and spawn `tunables.worker_max` worker tasks.
    ///
    /// The spec allows a pool that scales between `worker_min` and
    /// `worker_max`; this implementation keeps a fixed pool sized at
    /// `worker_max` (idle workers parked on an empty channel cost nothing
    /// but a stack) — see DESIGN.md for the simplification.
    ///
    /// Returns the pipeline alongside the join handles for its worker
    /// tasks. Graceful shutdown is: stop calling `enqueue`, drop every
    /// `Arc<DispatchPipeline>` clone (closing `sender` once the last one
    /// goes away), then await the handles — each worker's `recv()` returns
    /// `None` once the channel is closed and drained, and the task exits.
    pub fn new(
        registry: Arc<AnalyzerRegistry>,
        counters: Arc<Counters>,
        tunables: Arc<Tunables>,
    ) -> (Arc<Self>, Vec<JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel(tunables.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let http = reqwest::Client::builder()
            .timeout(tunables.request_timeout + Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        let workers = Workers {
            http,
            registry,
            counters,
            tunables: tunables.clone(),
        };

        let mut handles = Vec::with_capacity(tunables.worker_max);
        for _ in 0..tunables.worker_max {
            let receiver = receiver.clone();
            let http = workers.http.clone();
            let registry = workers.registry.clone();
            let counters = workers.counters.clone();
            let tunables = workers.tunables.clone();
            handles.push(tokio::spawn(async move {
                let worker = Workers {
                    http,
                    registry,
                    counters,
                    tunables,
                };
                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };
                    match job {
                        Some(job) => worker.process(job).await,
                        None => break,
                    }
                }
            }));
        }

        (Arc::new(Self { sender, workers }), handles)
    }

    /// Enqueue a packet for delivery to `target`. Applies caller-runs
    /// backpressure when the bounded queue is full (spec §4.4, §9).
    pub async fn enqueue(&self, packet: LogPacket, target: usize) -> EnqueueOutcome {
        let job = DispatchJob { packet, target };
        match self.sender.try_send(job) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(DispatchJob { packet, target })) => {
                self.workers.process(DispatchJob { packet, target }).await;
                EnqueueOutcome::SentInline
            }
            Err(mpsc::error::TrySendError::Closed(DispatchJob { packet, target })) => {
                // Shutting down: the channel is already closed. Run inline
                // rather than silently dropping the packet.
                self.workers.process(DispatchJob { packet, target }).await;
                EnqueueOutcome::SentInline
            }
        }
    }
}
