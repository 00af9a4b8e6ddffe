//! Deferred enrichment queue
//!
//! Accepted deliveries schedule a job here and return immediately. A dispatcher
//! task moves jobs into execution while honouring two limits:
//!
//! - `max_concurrency` jobs in flight, counting the delay wait
//! - `queue_depth` jobs waiting for a free slot; further jobs are rejected
//!
//! Each job waits until `delay` has elapsed since it was scheduled, then runs
//! the [`Enricher`]. Results go to a broadcast channel that nobody is required
//! to consume, and to the counters exposed by [`EnrichmentQueue::stats`].
//! Failures are logged and never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::enrich::Enricher;
use crate::error::{RelayError, Result};
use crate::record::RecordFields;

/// Capacity of the outcome broadcast channel; slow subscribers lose old outcomes
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// A scheduled enrichment
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub id: Uuid,
    pub gid: String,
    pub scheduled_at: DateTime<Utc>,
    not_before: Instant,
}

/// Terminal state of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Forwarded {
        job_id: Uuid,
        gid: String,
        fields: RecordFields,
        shape_warnings: Vec<String>,
    },
    Failed {
        job_id: Uuid,
        gid: String,
        error: String,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> Uuid {
        match self {
            JobOutcome::Forwarded { job_id, .. } | JobOutcome::Failed { job_id, .. } => *job_id,
        }
    }

    pub fn gid(&self) -> &str {
        match self {
            JobOutcome::Forwarded { gid, .. } | JobOutcome::Failed { gid, .. } => gid,
        }
    }
}

/// Snapshot of queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Jobs accepted by `schedule`
    pub scheduled: u64,
    /// Jobs refused because the queue was full
    pub rejected: u64,
    /// Jobs whose record was forwarded
    pub completed: u64,
    /// Jobs that failed to fetch or forward
    pub failed: u64,
    /// Jobs currently holding a slot
    pub in_flight: u64,
}

#[derive(Debug, Default)]
struct Counters {
    scheduled: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicU64,
}

/// Counts a job as in flight until dropped
struct InFlightGuard(Arc<Counters>);

impl InFlightGuard {
    fn enter(counters: Arc<Counters>) -> Self {
        counters.in_flight.fetch_add(1, Ordering::Relaxed);
        Self(counters)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

struct Inner {
    config: QueueConfig,
    jobs_tx: mpsc::Sender<EnrichmentJob>,
    outcomes_tx: broadcast::Sender<JobOutcome>,
    shutdown_tx: watch::Sender<bool>,
    counters: Arc<Counters>,
}

/// Handle to the enrichment queue; cheap to clone
#[derive(Clone)]
pub struct EnrichmentQueue {
    inner: Arc<Inner>,
}

impl EnrichmentQueue {
    /// Start the dispatcher task. Must be called inside a tokio runtime.
    pub fn start(config: QueueConfig, enricher: Arc<Enricher>) -> (Self, JoinHandle<()>) {
        // Limits below one would stall the queue
        let config = QueueConfig {
            max_concurrency: config.max_concurrency.max(1),
            queue_depth: config.queue_depth.max(1),
            ..config
        };
        let (jobs_tx, jobs_rx) = mpsc::channel(config.queue_depth);
        let (outcomes_tx, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let slots = Arc::new(Semaphore::new(config.max_concurrency));
        let counters = Arc::new(Counters::default());

        info!(
            delay_secs = config.delay.as_secs_f64(),
            max_concurrency = config.max_concurrency,
            queue_depth = config.queue_depth,
            "Starting enrichment queue"
        );

        let dispatcher = Dispatcher {
            jobs_rx,
            shutdown_rx,
            enricher,
            slots,
            outcomes_tx: outcomes_tx.clone(),
            counters: counters.clone(),
        };
        let handle = tokio::spawn(dispatcher.run());

        let queue = Self {
            inner: Arc::new(Inner {
                config,
                jobs_tx,
                outcomes_tx,
                shutdown_tx,
                counters,
            }),
        };
        (queue, handle)
    }

    /// Schedule enrichment of a task without waiting for it
    pub fn schedule(&self, gid: impl Into<String>) -> Result<Uuid> {
        if *self.inner.shutdown_tx.borrow() {
            return Err(RelayError::QueueClosed);
        }

        let job = EnrichmentJob {
            id: Uuid::now_v7(),
            gid: gid.into(),
            scheduled_at: Utc::now(),
            not_before: Instant::now() + self.inner.config.delay,
        };
        let job_id = job.id;

        match self.inner.jobs_tx.try_send(job) {
            Ok(()) => {
                self.inner.counters.scheduled.fetch_add(1, Ordering::Relaxed);
                Ok(job_id)
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                self.inner.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(gid = %job.gid, "Enrichment queue full, dropping job");
                Err(RelayError::QueueFull(self.inner.config.queue_depth))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(RelayError::QueueClosed),
        }
    }

    /// Receive outcomes of jobs finishing after this call
    pub fn subscribe(&self) -> broadcast::Receiver<JobOutcome> {
        self.inner.outcomes_tx.subscribe()
    }

    pub fn stats(&self) -> QueueStats {
        let counters = &self.inner.counters;
        QueueStats {
            scheduled: counters.scheduled.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            in_flight: counters.in_flight.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Stop accepting jobs. Waiting jobs are dropped, running jobs are left
    /// to finish on their own.
    pub fn shutdown(&self) {
        if !self.inner.shutdown_tx.send_replace(true) {
            info!("Enrichment queue shutting down");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }
}

/// Moves jobs from the channel into slot-limited execution
struct Dispatcher {
    jobs_rx: mpsc::Receiver<EnrichmentJob>,
    shutdown_rx: watch::Receiver<bool>,
    enricher: Arc<Enricher>,
    slots: Arc<Semaphore>,
    outcomes_tx: broadcast::Sender<JobOutcome>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    async fn run(mut self) {
        loop {
            // A slot is taken before a job leaves the channel, so every waiting
            // job counts against the channel's capacity
            let permit = tokio::select! {
                biased;
                _ = self.shutdown_rx.wait_for(|closed| *closed) => break,
                permit = self.slots.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let job = tokio::select! {
                biased;
                _ = self.shutdown_rx.wait_for(|closed| *closed) => break,
                job = self.jobs_rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let in_flight = InFlightGuard::enter(self.counters.clone());
            let enricher = self.enricher.clone();
            let outcomes_tx = self.outcomes_tx.clone();
            let counters = self.counters.clone();

            tokio::spawn(async move {
                let _permit = permit;
                tokio::time::sleep_until(job.not_before).await;

                debug!(job_id = %job.id, gid = %job.gid, scheduled_at = %job.scheduled_at, "Running enrichment job");
                let outcome = match enricher.enrich(&job.gid).await {
                    Ok(report) => {
                        counters.completed.fetch_add(1, Ordering::Relaxed);
                        info!(job_id = %job.id, gid = %job.gid, "Task record forwarded");
                        JobOutcome::Forwarded {
                            job_id: job.id,
                            gid: job.gid,
                            fields: report.fields,
                            shape_warnings: report.shape_warnings,
                        }
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        error!(job_id = %job.id, gid = %job.gid, error = %e, "Enrichment failed");
                        JobOutcome::Failed {
                            job_id: job.id,
                            gid: job.gid,
                            error: e.to_string(),
                        }
                    }
                };

                drop(in_flight);
                // No subscribers is fine
                let _ = outcomes_tx.send(outcome);
            });
        }

        debug!("Enrichment dispatcher stopped");
    }
}
