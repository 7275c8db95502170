use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of action kinds the sync engine knows how to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    WorkOrderStatus,
    DailyInspection,
    InspectionItemUpdate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [
        ActionKind::WorkOrderStatus,
        ActionKind::DailyInspection,
        ActionKind::InspectionItemUpdate,
    ];

    /// Tag stored in the `action_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::WorkOrderStatus => "work_order_status",
            ActionKind::DailyInspection => "daily_inspection",
            ActionKind::InspectionItemUpdate => "inspection_item_update",
        }
    }

    /// Returns `None` for tags this build does not know.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status/notes/cost change on a single work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderStatusChange {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// When the work was completed on the device. Stamped at enqueue time for
    /// `completed` changes that don't carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkOrderStatusChange {
    pub fn is_completion(&self) -> bool {
        self.status == "completed"
    }
}

/// A full daily inspection: one header plus a check per asset.
///
/// `inspection_id` is generated when the form is submitted so that replaying
/// the submission upserts the same remote rows instead of creating new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInspectionSubmission {
    pub inspection_id: Uuid,
    pub property_id: String,
    pub inspector_id: String,
    pub inspection_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<InspectionCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionCheck {
    pub asset_id: String,
    /// Free-form status as captured by the form; mapped before it is sent.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

/// Update of one already-synced inspection item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItemUpdate {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

/// A user-initiated mutation, tagged by kind and carrying its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    WorkOrderStatus(WorkOrderStatusChange),
    DailyInspection(DailyInspectionSubmission),
    InspectionItemUpdate(InspectionItemUpdate),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::WorkOrderStatus(_) => ActionKind::WorkOrderStatus,
            Action::DailyInspection(_) => ActionKind::DailyInspection,
            Action::InspectionItemUpdate(_) => ActionKind::InspectionItemUpdate,
        }
    }

    /// Fill capture-time fields the caller left empty.
    pub fn stamp(&mut self, captured_at: DateTime<Utc>) {
        if let Action::WorkOrderStatus(change) = self {
            if change.is_completion() && change.completed_at.is_none() {
                change.completed_at = Some(captured_at);
            }
        }
    }

    /// The payload as stored in the queue, without the kind tag.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Action::WorkOrderStatus(p) => serde_json::to_value(p),
            Action::DailyInspection(p) => serde_json::to_value(p),
            Action::InspectionItemUpdate(p) => serde_json::to_value(p),
        }
    }

    /// Rebuild a typed action from a stored kind and payload.
    pub fn from_parts(
        kind: ActionKind,
        payload: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ActionKind::WorkOrderStatus => Action::WorkOrderStatus(serde_json::from_value(payload)?),
            ActionKind::DailyInspection => Action::DailyInspection(serde_json::from_value(payload)?),
            ActionKind::InspectionItemUpdate => {
                Action::InspectionItemUpdate(serde_json::from_value(payload)?)
            }
        })
    }
}
