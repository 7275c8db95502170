//! When to flush, and what to tell the user afterwards.

use tokio::sync::watch;

use crate::flush::FlushReport;
use crate::state::{AppState, SharedState};

/// Stable toast id shared by every message of a sync cycle, so later messages
/// replace earlier ones instead of stacking.
pub const SYNC_TOAST_ID: &str = "offline-sync";

const SYNC_ISSUES_HINT: &str = "Review them in Settings > Sync Issues.";

/// The toast surface.
pub trait Notifier: Send + Sync {
    fn info(&self, id: &str, message: &str);
    fn success(&self, id: &str, message: &str);
    fn error(&self, id: &str, message: &str);
}

/// Writes notifications to the log. Used when no UI is attached.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, id: &str, message: &str) {
        tracing::info!(toast = id, "{message}");
    }

    fn success(&self, id: &str, message: &str) {
        tracing::info!(toast = id, "{message}");
    }

    fn error(&self, id: &str, message: &str) {
        tracing::warn!(toast = id, "{message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing was pending; no flush ran.
    Idle,
    Flushed(FlushReport),
    /// The store could not be read.
    Failed(String),
}

/// The user-facing summary of a flush, if there is anything to say.
pub fn summarize(report: &FlushReport) -> Option<Notice> {
    let FlushReport { synced, failed, .. } = *report;
    match (synced, failed) {
        (0, 0) => None,
        (synced, 0) => Some(Notice {
            level: NoticeLevel::Success,
            message: format!("{} synced", changes(synced)),
        }),
        (0, failed) => Some(Notice {
            level: NoticeLevel::Error,
            message: format!("{} failed to sync. {SYNC_ISSUES_HINT}", changes(failed)),
        }),
        (synced, failed) => Some(Notice {
            level: NoticeLevel::Error,
            message: format!(
                "{} synced, {failed} failed. {SYNC_ISSUES_HINT}",
                changes(synced)
            ),
        }),
    }
}

fn changes(n: usize) -> String {
    if n == 1 {
        "1 change".to_string()
    } else {
        format!("{n} changes")
    }
}

fn notify(state: &AppState, notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => state.notifier.info(SYNC_TOAST_ID, &notice.message),
        NoticeLevel::Success => state.notifier.success(SYNC_TOAST_ID, &notice.message),
        NoticeLevel::Error => state.notifier.error(SYNC_TOAST_ID, &notice.message),
    }
}

/// Flush the offline queue if anything runnable is pending, then report the
/// result.
///
/// Pending records no handler can run are left alone and never toasted.
/// Store errors are caught here and reported as a generic sync failure.
pub async fn flush_offline_queue(state: &AppState, show_toast: bool) -> SyncOutcome {
    if state.executor.is_running() {
        tracing::debug!("Flush already in progress, skipping sync");
        return SyncOutcome::Idle;
    }

    let runnable = match state.executor.runnable().await {
        Ok(runnable) => runnable,
        Err(e) => return report_failure(state, show_toast, &e.to_string()),
    };

    if runnable == 0 {
        return SyncOutcome::Idle;
    }

    if show_toast {
        state
            .notifier
            .info(SYNC_TOAST_ID, &format!("Syncing {}...", changes(runnable)));
    }

    let report = match state.executor.flush().await {
        Ok(report) => report,
        Err(e) => return report_failure(state, show_toast, &e.to_string()),
    };

    if show_toast {
        if let Some(notice) = summarize(&report) {
            notify(state, &notice);
        }
    }

    SyncOutcome::Flushed(report)
}

fn report_failure(state: &AppState, show_toast: bool, reason: &str) -> SyncOutcome {
    tracing::error!("Offline sync failed: {reason}");
    if show_toast {
        state
            .notifier
            .error(SYNC_TOAST_ID, "Couldn't sync offline changes. They are still saved on this device.");
    }
    SyncOutcome::Failed(reason.to_string())
}

/// Flush at startup (when online) and on every offline-to-online transition,
/// until `shutdown` flips to true.
pub async fn run_trigger(
    state: SharedState,
    mut online: watch::Receiver<bool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut was_online = *online.borrow_and_update();
    if was_online {
        flush_offline_queue(&state, true).await;
    }

    loop {
        tokio::select! {
            res = online.changed() => {
                if res.is_err() {
                    break;
                }
                let now_online = *online.borrow_and_update();
                if now_online && !was_online {
                    tracing::info!("Back online, flushing offline queue");
                    flush_offline_queue(&state, true).await;
                }
                was_online = now_online;
            }
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Sync trigger stopped");
}
