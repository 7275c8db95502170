//! Durable storage for queued actions.
//!
//! Every write is a single statement on a `synchronous = FULL` connection, so
//! a successful return means the row reached disk.

use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{ActionRecord, ActionStatus};

/// All records in insertion order. An empty store yields an empty vec.
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<ActionRecord>, sqlx::Error> {
    sqlx::query_as::<_, ActionRecord>("SELECT * FROM action_queue ORDER BY seq ASC")
        .fetch_all(pool)
        .await
}

pub async fn list_by_status(
    pool: &SqlitePool,
    status: ActionStatus,
) -> Result<Vec<ActionRecord>, sqlx::Error> {
    sqlx::query_as::<_, ActionRecord>(
        "SELECT * FROM action_queue WHERE status = ?1 ORDER BY seq ASC",
    )
    .bind(status)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<ActionRecord>, sqlx::Error> {
    sqlx::query_as::<_, ActionRecord>("SELECT * FROM action_queue WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Insert a record, or overwrite the mutable fields of an existing one.
///
/// `action_type`, `payload` and `created_at` are never rewritten.
pub async fn put(pool: &SqlitePool, record: &ActionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO action_queue
             (id, action_type, payload, status, attempts, last_error, created_at, last_attempt_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (id) DO UPDATE SET
             status = excluded.status,
             attempts = excluded.attempts,
             last_error = excluded.last_error,
             last_attempt_at = excluded.last_attempt_at",
    )
    .bind(record.id)
    .bind(&record.action_type)
    .bind(Json(&record.payload))
    .bind(record.status)
    .bind(record.attempts)
    .bind(&record.last_error)
    .bind(record.created_at)
    .bind(record.last_attempt_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Write the mutable fields only if the stored status still equals `expected`.
/// Returns false when the row was removed or moved on in the meantime.
pub async fn update_state(
    pool: &SqlitePool,
    record: &ActionRecord,
    expected: ActionStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE action_queue
         SET status = ?1, attempts = ?2, last_error = ?3, last_attempt_at = ?4
         WHERE id = ?5 AND status = ?6",
    )
    .bind(record.status)
    .bind(record.attempts)
    .bind(&record.last_error)
    .bind(record.last_attempt_at)
    .bind(record.id)
    .bind(expected)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Delete a record. Removing an unknown id is not an error.
pub async fn remove(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM action_queue WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(ActionStatus, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (ActionStatus, i64)>(
        "SELECT status, COUNT(*) FROM action_queue GROUP BY status",
    )
    .fetch_all(pool)
    .await
}
