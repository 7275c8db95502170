pub mod daily_inspection;
pub mod inspection_item;
pub mod item_status;
pub mod work_order;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Action, ActionKind};
use crate::remote::RemoteError;

#[derive(Debug)]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    /// A handler was given an action of a kind it does not handle.
    pub fn unexpected(expected: ActionKind, action: &Action) -> Self {
        ActionError {
            message: format!("expected a {expected} action, got {}", action.kind()),
        }
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActionError {}

impl From<String> for ActionError {
    fn from(s: String) -> Self {
        ActionError { message: s }
    }
}

impl From<&str> for ActionError {
    fn from(s: &str) -> Self {
        ActionError {
            message: s.to_string(),
        }
    }
}

impl From<RemoteError> for ActionError {
    fn from(err: RemoteError) -> Self {
        ActionError {
            message: err.to_string(),
        }
    }
}

/// Performs the remote write for one action kind.
///
/// Success is `Ok(())`; anything else is reported back as a failed record
/// carrying the error message.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn kind(&self) -> ActionKind;
    async fn execute(&self, action: &Action) -> Result<(), ActionError>;
}

/// Maps each action kind to its handler. Built once at startup and handed to
/// the flush executor.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its kind, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        let kind = handler.kind();
        if self.handlers.insert(kind, handler).is_some() {
            tracing::debug!("Replaced handler for {kind}");
        }
    }

    pub fn get(&self, kind: ActionKind) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(&kind)
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.handlers.keys().copied().collect()
    }
}
