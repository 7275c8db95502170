mod common;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use fieldsync::db;
use fieldsync::error::QueueError;
use fieldsync::models::{Action, ActionRecord, ActionStatus};
use fieldsync::queue::{ActionQueue, INTERRUPTED_ERROR};

use common::work_order;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Store a record directly in the given status, bypassing the state machine.
async fn seed(queue: &ActionQueue, id: &str, status: ActionStatus) -> Uuid {
    let mut record = ActionRecord::new(&work_order(id, "open"), Utc::now()).unwrap();
    record.status = status;
    if status == ActionStatus::Failed {
        record.last_error = Some("boom".to_string());
        record.attempts = 1;
    }
    db::action_queue::put(queue.pool(), &record).await.unwrap();
    record.id
}

// ── Durable store ───────────────────────────────────────────────

#[tokio::test]
async fn empty_store_returns_no_records() {
    let store = common::spawn_store().await;

    let records = db::action_queue::get_all(&store.pool).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn enqueued_actions_survive_restart() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let first = queue.enqueue(work_order("wo-1", "completed")).await.unwrap();
    let second = queue.enqueue(work_order("wo-2", "in_progress")).await.unwrap();
    let third = queue.enqueue(work_order("wo-3", "on_hold")).await.unwrap();

    let store = store.reopen().await;
    let queue = ActionQueue::new(store.pool.clone());

    let records = queue.list(None).await.unwrap();
    let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first, second, third]);
    assert!(records.iter().all(|r| r.status == ActionStatus::Pending));
    assert!(records.iter().all(|r| r.attempts == 0 && r.last_error.is_none()));
    assert_eq!(records[1].action().unwrap(), work_order("wo-2", "in_progress"));
}

#[tokio::test]
async fn put_overwrites_by_id_without_reordering() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let first = queue.enqueue(work_order("wo-1", "open")).await.unwrap();
    let second = queue.enqueue(work_order("wo-2", "open")).await.unwrap();

    let mut record = queue.get(first).await.unwrap().unwrap();
    record.attempts = 4;
    db::action_queue::put(&store.pool, &record).await.unwrap();

    let records = db::action_queue::get_all(&store.pool).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, first);
    assert_eq!(records[0].attempts, 4);
    assert_eq!(records[1].id, second);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let id = queue.enqueue(work_order("wo-1", "open")).await.unwrap();

    db::action_queue::remove(&store.pool, id).await.unwrap();
    db::action_queue::remove(&store.pool, id).await.unwrap();
    db::action_queue::remove(&store.pool, Uuid::now_v7()).await.unwrap();

    assert!(queue.get(id).await.unwrap().is_none());
}

// ── Queue API ───────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_status() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let pending = queue.enqueue(work_order("wo-1", "open")).await.unwrap();
    let failed = seed(&queue, "wo-2", ActionStatus::Failed).await;

    let only_pending = queue.list(Some(ActionStatus::Pending)).await.unwrap();
    assert_eq!(only_pending.len(), 1);
    assert_eq!(only_pending[0].id, pending);

    let only_failed = queue.list(Some(ActionStatus::Failed)).await.unwrap();
    assert_eq!(only_failed.len(), 1);
    assert_eq!(only_failed[0].id, failed);
    assert_eq!(only_failed[0].last_error.as_deref(), Some("boom"));

    assert_eq!(queue.list(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn enqueue_at_keeps_the_given_creation_time() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let id = queue.enqueue_at(work_order("wo-1", "open"), at(1_700_000_000)).await.unwrap();

    let record = queue.get(id).await.unwrap().unwrap();
    assert_eq!(record.created_at, at(1_700_000_000));
    assert_eq!(record.action_type, "work_order_status");
}

#[tokio::test]
async fn completion_is_stamped_with_capture_time() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let done = queue.enqueue_at(work_order("wo-1", "completed"), at(1_700_000_000)).await.unwrap();
    let open = queue.enqueue_at(work_order("wo-2", "open"), at(1_700_000_000)).await.unwrap();

    let Action::WorkOrderStatus(change) = queue.get(done).await.unwrap().unwrap().action().unwrap() else {
        panic!("expected a work order action");
    };
    assert_eq!(change.completed_at, Some(at(1_700_000_000)));

    let Action::WorkOrderStatus(change) = queue.get(open).await.unwrap().unwrap().action().unwrap() else {
        panic!("expected a work order action");
    };
    assert_eq!(change.completed_at, None);
}

#[tokio::test]
async fn caller_supplied_completion_time_is_kept() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let mut action = work_order("wo-1", "completed");
    if let Action::WorkOrderStatus(change) = &mut action {
        change.completed_at = Some(at(1_600_000_000));
    }
    let id = queue.enqueue_at(action, at(1_700_000_000)).await.unwrap();

    let record = queue.get(id).await.unwrap().unwrap();
    assert_eq!(record.payload["completed_at"], serde_json::json!(at(1_600_000_000)));
}

#[tokio::test]
async fn retry_resets_failed_record() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());
    let id = seed(&queue, "wo-1", ActionStatus::Failed).await;

    queue.retry(id).await.unwrap();

    let record = queue.get(id).await.unwrap().unwrap();
    assert_eq!(record.status, ActionStatus::Pending);
    assert!(record.last_error.is_none());
    assert_eq!(record.attempts, 1, "attempt history is kept across retries");
}

#[tokio::test]
async fn retry_rejects_records_that_have_not_failed() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());
    let id = queue.enqueue(work_order("wo-1", "open")).await.unwrap();

    let err = queue.retry(id).await.unwrap_err();
    assert!(matches!(
        err,
        QueueError::InvalidTransition {
            from: ActionStatus::Pending,
            to: ActionStatus::Pending,
            ..
        }
    ));
}

#[tokio::test]
async fn retry_unknown_id_is_not_found() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());

    let missing = Uuid::now_v7();
    let err = queue.retry(missing).await.unwrap_err();
    assert!(matches!(err, QueueError::NotFound(id) if id == missing));
}

#[tokio::test]
async fn retry_all_failed_resets_every_failed_record() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());
    seed(&queue, "wo-1", ActionStatus::Failed).await;
    seed(&queue, "wo-2", ActionStatus::Failed).await;
    queue.enqueue(work_order("wo-3", "open")).await.unwrap();

    let reset = queue.retry_all_failed().await.unwrap();

    assert_eq!(reset, 2);
    assert!(queue.list(Some(ActionStatus::Failed)).await.unwrap().is_empty());
    assert_eq!(queue.list(Some(ActionStatus::Pending)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn discard_removes_regardless_of_status() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());
    let pending = queue.enqueue(work_order("wo-1", "open")).await.unwrap();
    let failed = seed(&queue, "wo-2", ActionStatus::Failed).await;

    queue.discard(pending).await.unwrap();
    queue.discard(failed).await.unwrap();

    assert!(queue.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn summary_counts_by_status() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());
    queue.enqueue(work_order("wo-1", "open")).await.unwrap();
    queue.enqueue(work_order("wo-2", "open")).await.unwrap();
    seed(&queue, "wo-3", ActionStatus::Failed).await;
    seed(&queue, "wo-4", ActionStatus::Syncing).await;

    let summary = queue.summary().await.unwrap();
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.syncing, 1);
}

#[tokio::test]
async fn recover_interrupted_fails_syncing_and_drops_synced() {
    let store = common::spawn_store().await;
    let queue = ActionQueue::new(store.pool.clone());
    let stuck = seed(&queue, "wo-1", ActionStatus::Syncing).await;
    let done = seed(&queue, "wo-2", ActionStatus::Synced).await;
    let pending = queue.enqueue(work_order("wo-3", "open")).await.unwrap();

    let interrupted = queue.recover_interrupted().await.unwrap();

    assert_eq!(interrupted, 1);
    let stuck = queue.get(stuck).await.unwrap().unwrap();
    assert_eq!(stuck.status, ActionStatus::Failed);
    assert_eq!(stuck.last_error.as_deref(), Some(INTERRUPTED_ERROR));
    assert!(queue.get(done).await.unwrap().is_none());
    assert_eq!(
        queue.get(pending).await.unwrap().unwrap().status,
        ActionStatus::Pending
    );
}

#[test]
fn status_machine_allows_only_documented_transitions() {
    use ActionStatus::*;

    let allowed = [(Pending, Syncing), (Syncing, Synced), (Syncing, Failed), (Failed, Pending)];
    for from in [Pending, Syncing, Synced, Failed] {
        for to in [Pending, Syncing, Synced, Failed] {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
}
