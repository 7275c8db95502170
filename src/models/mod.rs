pub mod action;
pub mod action_queue;

pub use action::{
    Action, ActionKind, DailyInspectionSubmission, InspectionCheck, InspectionItemUpdate,
    WorkOrderStatusChange,
};
pub use action_queue::{ActionRecord, ActionStatus, QueueSummary};
