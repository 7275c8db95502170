use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::item_status::map_item_status;
use super::{ActionError, ActionHandler};
use crate::models::{Action, ActionKind, DailyInspectionSubmission};
use crate::remote::RemoteClient;

const HEADER_TABLE: &str = "daily_inspections";
const ITEM_TABLE: &str = "daily_inspection_items";
const ITEM_KEY: &str = "inspection_id,asset_id";

/// Submits a whole daily inspection: the header row, then one row per check.
///
/// Both writes are upserts keyed by ids fixed at enqueue time, so replaying a
/// submission that failed halfway converges on the same remote rows.
pub struct DailyInspectionHandler {
    remote: Arc<RemoteClient>,
}

impl DailyInspectionHandler {
    pub fn new(remote: Arc<RemoteClient>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl ActionHandler for DailyInspectionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::DailyInspection
    }

    async fn execute(&self, action: &Action) -> Result<(), ActionError> {
        let Action::DailyInspection(submission) = action else {
            return Err(ActionError::unexpected(self.kind(), action));
        };

        self.remote
            .upsert(HEADER_TABLE, &header_row(submission), None)
            .await
            .map_err(|e| ActionError::from(format!("Inspection header: {e}")))?;

        if submission.items.is_empty() {
            return Ok(());
        }

        self.remote
            .upsert(ITEM_TABLE, &item_rows(submission), Some(ITEM_KEY))
            .await
            .map_err(|e| ActionError::from(format!("Inspection items: {e}")))?;

        Ok(())
    }
}

fn header_row(submission: &DailyInspectionSubmission) -> serde_json::Value {
    json!({
        "id": submission.inspection_id,
        "property_id": &submission.property_id,
        "inspector_id": &submission.inspector_id,
        "inspection_date": submission.inspection_date,
        "notes": &submission.notes,
        "status": "submitted",
    })
}

fn item_rows(submission: &DailyInspectionSubmission) -> serde_json::Value {
    submission
        .items
        .iter()
        .map(|item| {
            json!({
                "inspection_id": submission.inspection_id,
                "asset_id": &item.asset_id,
                "status": map_item_status(&item.status).as_str(),
                "notes": &item.notes,
                "photo_urls": &item.photos,
            })
        })
        .collect()
}
