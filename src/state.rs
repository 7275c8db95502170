use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::actions::HandlerRegistry;
use crate::flush::FlushExecutor;
use crate::queue::ActionQueue;
use crate::sync::Notifier;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub queue: ActionQueue,
    pub executor: FlushExecutor,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        handlers: HandlerRegistry,
        handler_timeout: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let queue = ActionQueue::new(pool);
        let executor = FlushExecutor::new(queue.clone(), Arc::new(handlers), handler_timeout);
        Self {
            queue,
            executor,
            notifier,
        }
    }
}
