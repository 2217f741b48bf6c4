//! # Delivery Pool
//!
//! Background delivery of outbound activities. Callers submit a job and get a
//! ticket back straight away; a supervisor task runs the jobs against the
//! federation engine with bounded concurrency. Every job ends in a
//! `DeliveryReport` that is logged, broadcast to subscribers and handed to
//! the ticket, so failures are observable instead of lost.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::activity::{Activity, ActivityKind};
use crate::config::DeliveryConfig;
use crate::errors::{FloorbError, Result};
use crate::federation::{ContextDone, FederationEngine, RequestContext};
use crate::shutdown::{ShutdownController, ShutdownReceiver, ShutdownType};

const REPORT_CHANNEL_CAPACITY: usize = 1024;

/// Failure reason reported when `queue_depth` jobs are already waiting
pub const QUEUE_FULL: &str = "delivery queue full";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
    Cancelled,
    TimedOut,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Final state of one delivery job.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub id: Uuid,
    pub request_id: Uuid,
    pub destination: Url,
    pub kind: ActivityKind,
    pub outcome: DeliveryOutcome,
    pub finished_at: DateTime<Utc>,
}

impl DeliveryReport {
    /// `Ok(())` if delivered, the failure as `Delivery` otherwise.
    pub fn into_result(self) -> Result<()> {
        match self.outcome {
            DeliveryOutcome::Delivered => Ok(()),
            DeliveryOutcome::Failed(reason) => Err(FloorbError::Delivery(reason)),
            DeliveryOutcome::Cancelled => Err(FloorbError::Delivery(format!(
                "delivery to {} cancelled",
                self.destination
            ))),
            DeliveryOutcome::TimedOut => Err(FloorbError::Delivery(format!(
                "delivery to {} timed out",
                self.destination
            ))),
        }
    }
}

/// Handle on a submitted delivery.
#[derive(Debug)]
pub struct DeliveryTicket {
    id: Uuid,
    done: oneshot::Receiver<DeliveryReport>,
}

impl DeliveryTicket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the delivery to finish. Dropping the ticket instead does not
    /// affect the delivery.
    pub async fn wait(self) -> Result<DeliveryReport> {
        self.done.await.map_err(|_| {
            FloorbError::Delivery(format!("delivery {} was dropped by the pool", self.id))
        })
    }
}

struct DeliveryJob {
    id: Uuid,
    ctx: RequestContext,
    destination: Url,
    activity: Activity,
    done_tx: oneshot::Sender<DeliveryReport>,
}

impl DeliveryJob {
    fn finish(self, outcome: DeliveryOutcome, reports: &broadcast::Sender<DeliveryReport>) {
        let report = DeliveryReport {
            id: self.id,
            request_id: self.ctx.id(),
            destination: self.destination,
            kind: self.activity.kind,
            outcome,
            finished_at: Utc::now(),
        };

        match &report.outcome {
            DeliveryOutcome::Delivered => info!(
                "Delivered {} {} to {}",
                report.kind, report.id, report.destination
            ),
            DeliveryOutcome::Failed(reason) => error!(
                "Delivery of {} {} to {} failed: {}",
                report.kind, report.id, report.destination, reason
            ),
            other => warn!(
                "Delivery of {} {} to {} ended: {:?}",
                report.kind, report.id, report.destination, other
            ),
        }

        // no subscribers is fine
        let _ = reports.send(report.clone());
        let _ = self.done_tx.send(report);
    }
}

/// # DeliveryPool
///
/// Supervised worker pool that hands activities to `FederationEngine::send`.
pub struct DeliveryPool {
    job_tx: mpsc::Sender<DeliveryJob>,
    reports: broadcast::Sender<DeliveryReport>,
    timeout: Option<Duration>,
    shutdown: Mutex<Option<ShutdownController>>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryPool {
    /// Start the pool. Must be called from inside a tokio runtime.
    pub fn new(engine: Arc<dyn FederationEngine>, config: &DeliveryConfig) -> Self {
        let (job_tx, job_rx) = mpsc::channel(config.queue_depth.max(1));
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let mut shutdown = ShutdownController::new();

        let supervisor = Supervisor {
            engine,
            job_rx,
            reports: reports.clone(),
            slots: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            halt: CancellationToken::new(),
            in_flight: JoinSet::new(),
        };
        let handle = tokio::spawn(supervisor.run(shutdown.subscribe()));

        info!(
            "Delivery pool started (max_in_flight={}, queue_depth={})",
            config.max_in_flight, config.queue_depth
        );

        Self {
            job_tx,
            reports,
            timeout: config.timeout(),
            shutdown: Mutex::new(Some(shutdown)),
            supervisor: Mutex::new(Some(handle)),
        }
    }

    /// Queue `activity` for delivery to `destination`.
    ///
    /// Never waits. If the queue is full the ticket resolves straight away as
    /// failed; if the pool is shut down it resolves as cancelled.
    pub fn submit(
        &self,
        ctx: &RequestContext,
        destination: Url,
        activity: Activity,
    ) -> DeliveryTicket {
        let (done_tx, done) = oneshot::channel();
        let id = Uuid::new_v4();
        let job = DeliveryJob {
            id,
            ctx: ctx.child(self.timeout),
            destination,
            activity,
            done_tx,
        };

        debug!("Queueing {} {} for {}", job.activity.kind, id, job.destination);
        match self.job_tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!("Delivery queue is full, dropping {}", id);
                job.finish(
                    DeliveryOutcome::Failed(QUEUE_FULL.to_string()),
                    &self.reports,
                );
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!("Delivery pool is shut down, dropping {}", id);
                job.finish(DeliveryOutcome::Cancelled, &self.reports);
            }
        }

        DeliveryTicket { id, done }
    }

    /// Stream of every report produced after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryReport> {
        self.reports.subscribe()
    }

    /// Stop the pool. `Graceful` finishes queued and running deliveries,
    /// `Force` cancels them. Later calls are no-ops.
    pub async fn shutdown(&self, shutdown_type: ShutdownType) {
        let controller = self
            .shutdown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(controller) = controller else {
            return;
        };
        controller.signal_shutdown(shutdown_type).await;

        let handle = self
            .supervisor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Delivery supervisor ended abnormally: {}", e);
            }
        }
        info!("Delivery pool stopped");
    }
}

struct Supervisor {
    engine: Arc<dyn FederationEngine>,
    job_rx: mpsc::Receiver<DeliveryJob>,
    reports: broadcast::Sender<DeliveryReport>,
    slots: Arc<Semaphore>,
    halt: CancellationToken,
    in_flight: JoinSet<()>,
}

impl Supervisor {
    async fn run(mut self, shutdown: ShutdownReceiver) {
        let shutdown = shutdown.wait_for_shutdown();
        tokio::pin!(shutdown);

        let signal = loop {
            tokio::select! {
                signal = &mut shutdown => break Some(signal),
                // only take a job when it can start right away
                job = self.job_rx.recv(), if self.slots.available_permits() > 0 => match job {
                    Some(job) => self.spawn(job).await,
                    None => break None,
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    Self::check_joined(joined);
                }
            }
        };

        self.job_rx.close();
        let shutdown_type = signal
            .as_ref()
            .map(|signal| signal.shutdown_type)
            .unwrap_or(ShutdownType::Graceful);
        if shutdown_type == ShutdownType::Force {
            self.halt.cancel();
        }

        while let Some(job) = self.job_rx.recv().await {
            match shutdown_type {
                ShutdownType::Graceful => self.spawn(job).await,
                ShutdownType::Force => job.finish(DeliveryOutcome::Cancelled, &self.reports),
            }
        }
        while let Some(joined) = self.in_flight.join_next().await {
            Self::check_joined(joined);
        }

        debug!("Delivery supervisor drained");
        if let Some(signal) = signal {
            signal.acknowledge();
        }
    }

    async fn spawn(&mut self, job: DeliveryJob) {
        let permit = match self.slots.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                job.finish(DeliveryOutcome::Cancelled, &self.reports);
                return;
            }
        };

        let engine = self.engine.clone();
        let reports = self.reports.clone();
        let halt = self.halt.clone();
        self.in_flight.spawn(async move {
            let outcome = deliver(engine.as_ref(), &job, &halt).await;
            job.finish(outcome, &reports);
            drop(permit);
        });
    }

    fn check_joined(joined: std::result::Result<(), tokio::task::JoinError>) {
        if let Err(e) = joined {
            error!("Delivery task panicked: {}", e);
        }
    }
}

async fn deliver(
    engine: &dyn FederationEngine,
    job: &DeliveryJob,
    halt: &CancellationToken,
) -> DeliveryOutcome {
    if halt.is_cancelled() || job.ctx.is_cancelled() {
        return DeliveryOutcome::Cancelled;
    }

    tokio::select! {
        result = engine.send(&job.ctx, &job.destination, &job.activity) => match result {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        },
        done = job.ctx.done() => match done {
            ContextDone::Cancelled => DeliveryOutcome::Cancelled,
            ContextDone::DeadlineExceeded => DeliveryOutcome::TimedOut,
        },
        _ = halt.cancelled() => DeliveryOutcome::Cancelled,
    }
}
