pub mod config;
pub mod error;
pub mod state;
pub mod db;
pub mod models;
pub mod actions;
pub mod queue;
pub mod flush;
pub mod sync;
pub mod connectivity;
pub mod remote;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::actions::daily_inspection::DailyInspectionHandler;
use crate::actions::inspection_item::InspectionItemHandler;
use crate::actions::work_order::WorkOrderStatusHandler;
use crate::actions::HandlerRegistry;
use crate::config::Config;
use crate::remote::RemoteClient;
use crate::state::{AppState, SharedState};
use crate::sync::Notifier;

/// A registry with a handler for every known action kind.
pub fn default_handlers(remote: Arc<RemoteClient>) -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(WorkOrderStatusHandler::new(remote.clone())));
    handlers.register(Arc::new(DailyInspectionHandler::new(remote.clone())));
    handlers.register(Arc::new(InspectionItemHandler::new(remote)));
    handlers
}

pub fn build_state(
    pool: SqlitePool,
    config: &Config,
    remote: Arc<RemoteClient>,
    notifier: Arc<dyn Notifier>,
) -> SharedState {
    Arc::new(AppState::new(
        pool,
        default_handlers(remote),
        config.handler_timeout,
        notifier,
    ))
}
