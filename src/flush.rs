//! The flush executor: replays pending actions against the backend.
//!
//! Records run one at a time in `created_at` order. A failure marks that record
//! and moves on to the next; only the initial read can fail a whole run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::actions::HandlerRegistry;
use crate::error::QueueError;
use crate::models::{ActionRecord, ActionStatus};
use crate::queue::ActionQueue;

/// Counts from one flush run.
///
/// `skipped` records had no handler and were left pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl FlushReport {
    pub fn attempted(&self) -> usize {
        self.synced + self.failed
    }
}

enum Outcome {
    Synced,
    Failed,
    Skipped,
}

pub struct FlushExecutor {
    queue: ActionQueue,
    handlers: Arc<HandlerRegistry>,
    handler_timeout: Duration,
    in_flight: AtomicBool,
}

impl FlushExecutor {
    pub fn new(queue: ActionQueue, handlers: Arc<HandlerRegistry>, handler_timeout: Duration) -> Self {
        Self {
            queue,
            handlers,
            handler_timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Pending records this executor would attempt right now. Records of an
    /// unknown kind or without a handler are not counted.
    pub async fn runnable(&self) -> Result<usize, QueueError> {
        let pending = self.queue.list(Some(ActionStatus::Pending)).await?;
        Ok(pending.iter().filter(|record| self.can_run(record)).count())
    }

    fn can_run(&self, record: &ActionRecord) -> bool {
        record
            .kind()
            .is_some_and(|kind| self.handlers.get(kind).is_some())
    }

    /// Run every pending action once.
    ///
    /// A call made while another flush is running returns an empty report
    /// without touching the store.
    pub async fn flush(&self) -> Result<FlushReport, QueueError> {
        let Some(_guard) = FlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Flush already in progress, ignoring trigger");
            return Ok(FlushReport::default());
        };

        let mut pending = self.queue.list(Some(ActionStatus::Pending)).await?;
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));

        tracing::debug!("Flushing {} pending action(s)", pending.len());

        let mut report = FlushReport::default();
        for record in pending {
            match self.process(record).await {
                Outcome::Synced => report.synced += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }

        tracing::info!(
            "Flush finished: {} synced, {} failed, {} skipped",
            report.synced,
            report.failed,
            report.skipped
        );

        Ok(report)
    }

    async fn process(&self, mut record: ActionRecord) -> Outcome {
        let Some(kind) = record.kind() else {
            tracing::warn!(
                "Skipping action {}: unknown action type '{}'",
                record.id,
                record.action_type
            );
            return Outcome::Skipped;
        };

        let Some(handler) = self.handlers.get(kind) else {
            tracing::warn!("Skipping action {}: no handler registered for {kind}", record.id);
            return Outcome::Skipped;
        };

        if let Err(e) = self.queue.transition(&mut record, ActionStatus::Syncing, None).await {
            tracing::error!("Could not start action {}: {e}", record.id);
            return Outcome::Skipped;
        }

        tracing::debug!(
            "Processing action {} ({kind}, attempt={})",
            record.id,
            record.attempts
        );

        let result = match record.action() {
            Ok(action) => match tokio::time::timeout(self.handler_timeout, handler.execute(&action)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.message),
                Err(_) => Err(format!(
                    "Timed out after {}s",
                    self.handler_timeout.as_secs_f64()
                )),
            },
            Err(e) => Err(format!("Invalid payload: {e}")),
        };

        match result {
            Ok(()) => {
                self.finish_synced(&mut record).await;
                Outcome::Synced
            }
            Err(message) => {
                tracing::warn!("Action {} failed: {message}", record.id);
                if let Err(e) = self
                    .queue
                    .transition(&mut record, ActionStatus::Failed, Some(message))
                    .await
                {
                    tracing::error!("Could not record failure of action {}: {e}", record.id);
                }
                Outcome::Failed
            }
        }
    }

    /// The remote write happened, so this counts as synced even if the local
    /// bookkeeping below fails; startup recovery cleans up after that case.
    async fn finish_synced(&self, record: &mut ActionRecord) {
        match self.queue.transition(record, ActionStatus::Synced, None).await {
            Ok(()) => {
                if let Err(e) = self.queue.remove_synced(record).await {
                    tracing::error!("Could not remove synced action {}: {e}", record.id);
                }
            }
            // Discarded by the user while its handler ran.
            Err(QueueError::NotFound(_)) => {}
            Err(e) => tracing::error!("Could not mark action {} synced: {e}", record.id),
        }
    }
}

/// Holds the single-flush flag for the duration of a run.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
