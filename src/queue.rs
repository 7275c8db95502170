//! The action queue: the only entry point UI code uses to record intent.
//!
//! Owns the status state machine. Payloads are only stamped with their
//! capture time; what an action does is the handler's business.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::QueueError;
use crate::models::{Action, ActionRecord, ActionStatus, QueueSummary};

/// Error recorded on records found in `syncing` at startup.
pub const INTERRUPTED_ERROR: &str = "Sync was interrupted before the result was known";

#[derive(Clone)]
pub struct ActionQueue {
    pool: SqlitePool,
}

impl ActionQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Durably record a new pending action and return its id.
    ///
    /// An error means nothing was saved.
    pub async fn enqueue(&self, action: Action) -> Result<Uuid, QueueError> {
        self.enqueue_at(action, Utc::now()).await
    }

    /// Like [`enqueue`](Self::enqueue) with an explicit creation time, for
    /// forms captured earlier than they are handed to the queue.
    pub async fn enqueue_at(
        &self,
        mut action: Action,
        created_at: DateTime<Utc>,
    ) -> Result<Uuid, QueueError> {
        action.stamp(created_at);
        let record = ActionRecord::new(&action, created_at)?;
        db::action_queue::put(&self.pool, &record).await?;

        tracing::debug!("Enqueued {} action {}", record.action_type, record.id);

        Ok(record.id)
    }

    pub async fn list(&self, filter: Option<ActionStatus>) -> Result<Vec<ActionRecord>, QueueError> {
        let records = match filter {
            Some(status) => db::action_queue::list_by_status(&self.pool, status).await?,
            None => db::action_queue::get_all(&self.pool).await?,
        };
        Ok(records)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ActionRecord>, QueueError> {
        Ok(db::action_queue::find_by_id(&self.pool, id).await?)
    }

    pub async fn summary(&self) -> Result<QueueSummary, QueueError> {
        let mut summary = QueueSummary::default();
        for (status, count) in db::action_queue::count_by_status(&self.pool).await? {
            let count = usize::try_from(count).unwrap_or(0);
            match status {
                ActionStatus::Pending => summary.pending = count,
                ActionStatus::Syncing => summary.syncing = count,
                ActionStatus::Failed => summary.failed = count,
                ActionStatus::Synced => {}
            }
        }
        Ok(summary)
    }

    /// Put a failed record back in line for the next flush.
    pub async fn retry(&self, id: Uuid) -> Result<(), QueueError> {
        let mut record = self.get(id).await?.ok_or(QueueError::NotFound(id))?;
        self.transition(&mut record, ActionStatus::Pending, None).await?;

        tracing::info!("Action {id} queued for retry");

        Ok(())
    }

    /// Retry every failed record. Returns how many were reset.
    pub async fn retry_all_failed(&self) -> Result<usize, QueueError> {
        let mut reset = 0;
        for mut record in self.list(Some(ActionStatus::Failed)).await? {
            match self.transition(&mut record, ActionStatus::Pending, None).await {
                Ok(()) => reset += 1,
                // Discarded or retried concurrently.
                Err(QueueError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(reset)
    }

    /// Permanently remove a record, whatever its status.
    pub async fn discard(&self, id: Uuid) -> Result<(), QueueError> {
        db::action_queue::remove(&self.pool, id).await?;

        tracing::info!("Action {id} discarded");

        Ok(())
    }

    /// Clean up after a run that died mid-flush.
    ///
    /// Records still `syncing` may or may not have reached the server, so they
    /// become `failed` for the user to retry or discard. Leftover `synced`
    /// records are removed. Returns the number of interrupted records.
    pub async fn recover_interrupted(&self) -> Result<usize, QueueError> {
        for record in self.list(Some(ActionStatus::Synced)).await? {
            db::action_queue::remove(&self.pool, record.id).await?;
        }

        let mut interrupted = 0;
        for mut record in self.list(Some(ActionStatus::Syncing)).await? {
            self.transition(&mut record, ActionStatus::Failed, Some(INTERRUPTED_ERROR.to_string()))
                .await?;
            interrupted += 1;
        }

        if interrupted > 0 {
            tracing::warn!("{interrupted} action(s) were interrupted mid-sync and marked failed");
        }

        Ok(interrupted)
    }

    /// Move `record` to `to`, enforcing the state machine.
    ///
    /// Entering `syncing` counts an attempt. `last_error` is kept only on
    /// `failed` records. Fails with `NotFound` if the stored row is gone or no
    /// longer in `record.status`.
    pub(crate) async fn transition(
        &self,
        record: &mut ActionRecord,
        to: ActionStatus,
        error: Option<String>,
    ) -> Result<(), QueueError> {
        let from = record.status;
        if !from.can_transition_to(to) {
            return Err(QueueError::InvalidTransition {
                id: record.id,
                from,
                to,
            });
        }

        let mut next = record.clone();
        next.status = to;
        next.last_error = if to == ActionStatus::Failed { error } else { None };
        if to == ActionStatus::Syncing {
            next.attempts += 1;
            next.last_attempt_at = Some(Utc::now());
        }

        if !db::action_queue::update_state(&self.pool, &next, from).await? {
            return Err(QueueError::NotFound(record.id));
        }

        *record = next;
        Ok(())
    }

    /// Drop a record that reached `synced`.
    pub(crate) async fn remove_synced(&self, record: &ActionRecord) -> Result<(), QueueError> {
        debug_assert_eq!(record.status, ActionStatus::Synced);
        db::action_queue::remove(&self.pool, record.id).await?;
        Ok(())
    }
}
