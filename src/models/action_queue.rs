use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::{Action, ActionKind};

/// Lifecycle of a queued action.
///
/// ```text
/// pending -> syncing -> synced
///               |
///               v
///            failed -> pending (manual retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Syncing => "syncing",
            ActionStatus::Synced => "synced",
            ActionStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(self, next: ActionStatus) -> bool {
        matches!(
            (self, next),
            (ActionStatus::Pending, ActionStatus::Syncing)
                | (ActionStatus::Syncing, ActionStatus::Synced)
                | (ActionStatus::Syncing, ActionStatus::Failed)
                | (ActionStatus::Failed, ActionStatus::Pending)
        )
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One durable unit of work in the offline queue.
///
/// `seq` is assigned by the store on first insert and breaks ties between
/// records sharing a `created_at`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seq: i64,
    pub id: Uuid,
    pub action_type: String,
    pub payload: serde_json::Value,
    pub status: ActionStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    /// A fresh pending record for `action`, not yet stored.
    pub fn new(action: &Action, created_at: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            seq: 0,
            id: Uuid::now_v7(),
            action_type: action.kind().as_str().to_string(),
            payload: action.payload()?,
            status: ActionStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at,
            last_attempt_at: None,
        })
    }

    /// The record's kind, or `None` if it was written by a build that knows
    /// kinds this one doesn't.
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.action_type)
    }

    /// Decode the typed action. Fails on unknown kinds or malformed payloads.
    pub fn action(&self) -> Result<Action, serde_json::Error> {
        let kind = self.kind().ok_or_else(|| {
            <serde_json::Error as serde::de::Error>::custom(format!(
                "unknown action type: {}",
                self.action_type
            ))
        })?;
        Action::from_parts(kind, self.payload.clone())
    }
}

/// Per-status counts, used for "N pending changes" badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub pending: usize,
    pub syncing: usize,
    pub failed: usize,
}
