use serde::{Deserialize, Serialize};

/// The status vocabulary accepted by the remote `daily_inspection_items` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteItemStatus {
    Good,
    NeedsAttention,
    Bad,
    NotApplicable,
}

impl RemoteItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteItemStatus::Good => "good",
            RemoteItemStatus::NeedsAttention => "needs_attention",
            RemoteItemStatus::Bad => "bad",
            RemoteItemStatus::NotApplicable => "not_applicable",
        }
    }
}

/// Translate a status captured by an inspection form into the remote
/// vocabulary. Values with no direct match map to `needs_attention`.
pub fn map_item_status(status: &str) -> RemoteItemStatus {
    match status.trim().to_ascii_lowercase().as_str() {
        "good" | "ok" | "pass" | "passed" => RemoteItemStatus::Good,
        "fair" | "worn" | "needs_attention" | "attention" | "monitor" => {
            RemoteItemStatus::NeedsAttention
        }
        "poor" | "bad" | "fail" | "failed" | "damaged" | "broken" | "missing" => {
            RemoteItemStatus::Bad
        }
        "na" | "n/a" | "not_applicable" => RemoteItemStatus::NotApplicable,
        other => {
            tracing::debug!("Unmapped inspection status '{other}', using needs_attention");
            RemoteItemStatus::NeedsAttention
        }
    }
}
