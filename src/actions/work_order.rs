use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{ActionError, ActionHandler};
use crate::models::{Action, ActionKind};
use crate::remote::RemoteClient;

const TABLE: &str = "work_orders";

pub struct WorkOrderStatusHandler {
    remote: Arc<RemoteClient>,
}

impl WorkOrderStatusHandler {
    pub fn new(remote: Arc<RemoteClient>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl ActionHandler for WorkOrderStatusHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::WorkOrderStatus
    }

    async fn execute(&self, action: &Action) -> Result<(), ActionError> {
        let Action::WorkOrderStatus(change) = action else {
            return Err(ActionError::unexpected(self.kind(), action));
        };

        if change.id.is_empty() {
            return Err(ActionError::from("work order id is required"));
        }

        let mut fields = json!({ "status": &change.status });
        if let Some(notes) = &change.notes {
            fields["notes"] = json!(notes);
        }
        if let Some(cost) = change.cost {
            fields["cost"] = json!(cost);
        }
        if change.is_completion() {
            if let Some(completed_at) = change.completed_at {
                fields["completed_at"] = json!(completed_at);
            }
        }

        self.remote.update(TABLE, &change.id, &fields).await?;
        Ok(())
    }
}
