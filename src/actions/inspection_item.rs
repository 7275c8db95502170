use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::item_status::map_item_status;
use super::{ActionError, ActionHandler};
use crate::models::{Action, ActionKind};
use crate::remote::RemoteClient;

const TABLE: &str = "daily_inspection_items";

pub struct InspectionItemHandler {
    remote: Arc<RemoteClient>,
}

impl InspectionItemHandler {
    pub fn new(remote: Arc<RemoteClient>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl ActionHandler for InspectionItemHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::InspectionItemUpdate
    }

    async fn execute(&self, action: &Action) -> Result<(), ActionError> {
        let Action::InspectionItemUpdate(update) = action else {
            return Err(ActionError::unexpected(self.kind(), action));
        };

        if update.id.is_empty() {
            return Err(ActionError::from("inspection item id is required"));
        }

        let mut fields = json!({ "status": map_item_status(&update.status).as_str() });
        if let Some(notes) = &update.notes {
            fields["notes"] = json!(notes);
        }
        if let Some(photos) = &update.photos {
            fields["photo_urls"] = json!(photos);
        }

        self.remote.update(TABLE, &update.id, &fields).await?;
        Ok(())
    }
}
