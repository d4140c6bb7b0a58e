//! Background task event processing.
//!
//! Every mutation driven by a finished task happens here, on the UI task.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::helpers::{schedule_highlight_clear, start_fetch};

pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::FeedLoaded { ticket, result } => {
            if let Some(generation) = app.handle_feed_loaded(ticket, result) {
                schedule_highlight_clear(app, generation, event_tx);
            }
            app.clamp_selection();
        }
        AppEvent::ProfileApplied(applied) => {
            let job = app.apply_settings(applied);
            start_fetch(app, job, event_tx);
        }
        AppEvent::HighlightExpired { generation } => {
            app.handle_highlight_expired(generation);
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
