#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::sync::Notify;

use fieldsync::actions::{ActionError, ActionHandler, HandlerRegistry};
use fieldsync::models::{Action, ActionKind, WorkOrderStatusChange};
use fieldsync::state::{AppState, SharedState};
use fieldsync::sync::{NoticeLevel, Notifier};

/// A migrated on-disk store in its own temporary directory.
pub struct TestStore {
    pub dir: TempDir,
    pub url: String,
    pub pool: SqlitePool,
}

impl TestStore {
    /// Close the pool and open the same file again, as a restarted process would.
    pub async fn reopen(self) -> TestStore {
        self.pool.close().await;
        let pool = fieldsync::db::connect(&self.url)
            .await
            .expect("Failed to reopen test store");
        TestStore {
            dir: self.dir,
            url: self.url,
            pool,
        }
    }
}

pub async fn spawn_store() -> TestStore {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("queue.db").display());
    let pool = fieldsync::db::connect(&url)
        .await
        .expect("Failed to open test store");
    TestStore { dir, url, pool }
}

pub fn state_with(
    pool: SqlitePool,
    handlers: Vec<Arc<dyn ActionHandler>>,
    notifier: Arc<dyn Notifier>,
) -> SharedState {
    state_with_timeout(pool, handlers, notifier, Duration::from_secs(5))
}

pub fn state_with_timeout(
    pool: SqlitePool,
    handlers: Vec<Arc<dyn ActionHandler>>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
) -> SharedState {
    let mut registry = HandlerRegistry::new();
    for handler in handlers {
        registry.register(handler);
    }
    Arc::new(AppState::new(pool, registry, timeout, notifier))
}

pub fn work_order(id: &str, status: &str) -> Action {
    Action::WorkOrderStatus(WorkOrderStatusChange {
        id: id.to_string(),
        status: status.to_string(),
        notes: None,
        cost: None,
        completed_at: None,
    })
}

pub fn work_order_id(action: &Action) -> &str {
    match action {
        Action::WorkOrderStatus(change) => &change.id,
        other => panic!("expected a work order action, got {other:?}"),
    }
}

/// Every action any stub handler was invoked with, in call order.
pub type CallLog = Arc<Mutex<Vec<Action>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

type Behavior = Box<dyn Fn(&Action) -> Result<(), String> + Send + Sync>;

pub struct StubHandler {
    kind: ActionKind,
    log: CallLog,
    behavior: Behavior,
}

impl StubHandler {
    pub fn ok(kind: ActionKind, log: CallLog) -> Arc<dyn ActionHandler> {
        Self::with(kind, log, |_| Ok(()))
    }

    pub fn with(
        kind: ActionKind,
        log: CallLog,
        behavior: impl Fn(&Action) -> Result<(), String> + Send + Sync + 'static,
    ) -> Arc<dyn ActionHandler> {
        Arc::new(Self {
            kind,
            log,
            behavior: Box::new(behavior),
        })
    }

    /// Fails the first `failures` calls, then succeeds.
    pub fn flaky(kind: ActionKind, log: CallLog, failures: usize) -> Arc<dyn ActionHandler> {
        let calls = AtomicUsize::new(0);
        Self::with(kind, log, move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) < failures {
                Err("remote unavailable".to_string())
            } else {
                Ok(())
            }
        })
    }
}

#[async_trait]
impl ActionHandler for StubHandler {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    async fn execute(&self, action: &Action) -> Result<(), ActionError> {
        self.log.lock().unwrap().push(action.clone());
        (self.behavior)(action).map_err(ActionError::from)
    }
}

/// Blocks inside `execute` until released, to hold a flush open.
pub struct GatedHandler {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
    pub calls: AtomicUsize,
}

impl GatedHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ActionHandler for GatedHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::WorkOrderStatus
    }

    async fn execute(&self, _action: &Action) -> Result<(), ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// Never finishes within any sensible timeout.
pub struct HangingHandler;

#[async_trait]
impl ActionHandler for HangingHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::WorkOrderStatus
    }

    async fn execute(&self, _action: &Action) -> Result<(), ActionError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(NoticeLevel, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<(NoticeLevel, String, String)> {
        std::mem::take(&mut *self.notices.lock().unwrap())
    }

    fn push(&self, level: NoticeLevel, id: &str, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((level, id.to_string(), message.to_string()));
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, id: &str, message: &str) {
        self.push(NoticeLevel::Info, id, message);
    }

    fn success(&self, id: &str, message: &str) {
        self.push(NoticeLevel::Success, id, message);
    }

    fn error(&self, id: &str, message: &str) {
        self.push(NoticeLevel::Error, id, message);
    }
}
