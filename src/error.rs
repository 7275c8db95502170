use uuid::Uuid;

use crate::models::ActionStatus;

#[derive(Debug)]
pub enum QueueError {
    NotFound(Uuid),
    InvalidTransition {
        id: Uuid,
        from: ActionStatus,
        to: ActionStatus,
    },
    Payload(serde_json::Error),
    Database(sqlx::Error),
    Migration(sqlx::migrate::MigrateError),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::NotFound(id) => write!(f, "Not Found: action {id}"),
            QueueError::InvalidTransition { id, from, to } => {
                write!(f, "Invalid Transition: action {id} cannot go from {from} to {to}")
            }
            QueueError::Payload(err) => write!(f, "Payload Error: {err}"),
            QueueError::Database(err) => write!(f, "Database Error: {err}"),
            QueueError::Migration(err) => write!(f, "Migration Error: {err}"),
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueueError::Payload(err) => Some(err),
            QueueError::Database(err) => Some(err),
            QueueError::Migration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        QueueError::Database(err)
    }
}

impl From<sqlx::migrate::MigrateError> for QueueError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        QueueError::Migration(err)
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Payload(err)
    }
}
