//! Background task spawning shared by input and event handling.
//!
//! Every task reports back through the `AppEvent` channel; none of them
//! touch `App` directly.

use crate::api::{ApiClient, ApiError};
use crate::app::{App, AppEvent};
use crate::feed::FetchJob;
use crate::sidebar::{AppliedSettings, ApplyRequest};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Wraps a future to catch panics and convert them to errors.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Send `event`, logging if the UI loop has already gone away.
async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent, name: &'static str) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

async fn report_panic(tx: &mpsc::Sender<AppEvent>, task: &'static str, error: String) {
    tracing::error!(task, error = %error, "Background task panicked");
    send_event(tx, AppEvent::TaskPanicked { task, error }, "TaskPanicked").await;
}

/// Run a feed request in the background and report `FeedLoaded`.
pub(super) fn spawn_feed_fetch(
    client: Arc<ApiClient>,
    job: FetchJob,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ticket = job.ticket;
        tracing::debug!(seq = ticket.seq, offset = ticket.offset, mode = ?ticket.mode, "Feed fetch started");
        match catch_task_panic(job.run(&client)).await {
            Ok(result) => {
                send_event(&tx, AppEvent::FeedLoaded { ticket, result }, "FeedLoaded").await;
            }
            Err(panic_msg) => {
                report_panic(&tx, "feed_fetch", panic_msg).await;
                let result = Err(ApiError::Aborted);
                send_event(&tx, AppEvent::FeedLoaded { ticket, result }, "FeedLoaded").await;
            }
        }
    })
}

/// Push the sidebar draft to the server and report `ProfileApplied`.
pub(super) fn spawn_profile_apply(
    client: Arc<ApiClient>,
    request: ApplyRequest,
    user_id: String,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    let fallback = request.fallback();
    tokio::spawn(async move {
        settle_profile_apply(request.resolve(&client, &user_id), fallback, &tx).await;
    })
}

/// Report the outcome of an apply. A panic still settles with the draft
/// fallback, so the follow-up refresh always happens.
async fn settle_profile_apply<F>(work: F, fallback: AppliedSettings, tx: &mpsc::Sender<AppEvent>)
where
    F: std::future::Future<Output = AppliedSettings>,
{
    let applied = match catch_task_panic(work).await {
        Ok(applied) => applied,
        Err(panic_msg) => {
            report_panic(tx, "profile_apply", panic_msg).await;
            fallback
        }
    };
    send_event(tx, AppEvent::ProfileApplied(applied), "ProfileApplied").await;
}

/// Start the fetch in `job` on behalf of `app`.
pub(super) fn start_fetch(app: &App, job: FetchJob, tx: &mpsc::Sender<AppEvent>) {
    spawn_feed_fetch(Arc::clone(&app.client), job, tx.clone());
}

/// Start a reset fetch unless one is already running.
pub(super) fn refresh(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    if !app.can_refresh() {
        return;
    }
    let job = app.request_reset();
    start_fetch(app, job, tx);
}

/// Start the sidebar apply round-trip if allowed.
pub(super) fn apply_sidebar(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some(request) = app.begin_apply() else {
        return;
    };
    spawn_profile_apply(
        Arc::clone(&app.client),
        request,
        app.user_id.clone(),
        tx.clone(),
    );
}

/// Replace the pending highlight timer with one for `generation`.
///
/// The previous timer is aborted; even if it had already fired, its event
/// carries an older generation and is ignored.
pub(super) fn schedule_highlight_clear(
    app: &mut App,
    generation: u64,
    tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(handle) = app.highlight_handle.take() {
        handle.abort();
        tracing::trace!("Aborted previous highlight timer");
    }

    let delay = app.highlight_delay;
    let tx = tx.clone();
    app.highlight_handle = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        send_event(&tx, AppEvent::HighlightExpired { generation }, "HighlightExpired").await;
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    fn app() -> App {
        let client = Arc::new(ApiClient::new("http://localhost:1").unwrap());
        App::new(client, &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_message() {
        let result: Result<(), String> = catch_task_panic(async {
            if true {
                panic!("boom");
            }
        })
        .await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_panicking_apply_still_refreshes() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = app();
        app.sidebar.apply_preset(2);
        let request = app.begin_apply().unwrap();
        let fallback = request.fallback();

        settle_profile_apply(
            async move {
                if true {
                    panic!("resolve blew up");
                }
                request.fallback()
            },
            fallback,
            &tx,
        )
        .await;

        match rx.recv().await {
            Some(AppEvent::TaskPanicked { task, error }) => {
                assert_eq!(task, "profile_apply");
                assert_eq!(error, "resolve blew up");
            }
            _ => panic!("expected TaskPanicked"),
        }
        let applied = match rx.recv().await {
            Some(AppEvent::ProfileApplied(applied)) => applied,
            _ => panic!("expected ProfileApplied"),
        };
        assert!(!applied.confirmed);
        assert_eq!(applied.profile.focus, "DoD and IC cybersecurity contracts");

        let job = app.apply_settings(applied);
        assert!(!app.sidebar.is_applying());
        assert_eq!(job.ticket.offset, 0);
        assert_eq!(app.feed.load_state(), crate::feed::LoadState::LoadingInitial);
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_timer_replaced() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = app();

        schedule_highlight_clear(&mut app, 1, &tx);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(2000)).await;
        schedule_highlight_clear(&mut app, 2, &tx);
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_millis(2500)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "first timer must have been aborted");

        tokio::time::advance(Duration::from_millis(1600)).await;
        match rx.recv().await {
            Some(AppEvent::HighlightExpired { generation }) => assert_eq!(generation, 2),
            _ => panic!("expected HighlightExpired"),
        }
    }
}
