use crate::api::{default_profile, ApiClient, ApiError, FeedItem, FeedResponse, SourceId, UserProfile};
use crate::config::Config;
use crate::feed::{FeedState, FetchJob, FetchOutcome, FetchTicket, LoadState, SortMode};
use crate::sidebar::{AppliedSettings, ApplyRequest, DraftField, SidebarDraft, SidebarRow};
use crate::theme::ColorPalette;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Focus & Events
// ============================================================================

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Feed,
    Sidebar,
}

/// Events from background tasks
pub enum AppEvent {
    /// A feed request finished. Applied only if `ticket` is still current.
    FeedLoaded {
        ticket: FetchTicket,
        result: Result<FeedResponse, ApiError>,
    },
    /// The sidebar's profile update settled (server profile or fallback).
    ProfileApplied(AppliedSettings),
    /// The highlight timer for reset `generation` fired.
    HighlightExpired { generation: u64 },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "feed_fetch")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub client: Arc<ApiClient>,
    pub user_id: String,
    pub highlight_delay: Duration,
    pub palette: ColorPalette,

    // -- Authoritative session state --
    pub feed: FeedState,
    pub profile: UserProfile,
    pub api_key: Option<SecretString>,
    pub active_sources: Vec<SourceId>,
    pub sort: SortMode,

    // -- Sidebar --
    pub sidebar: SidebarDraft,
    pub sidebar_rows: Vec<SidebarRow>,
    pub sidebar_cursor: usize,
    pub editing: Option<DraftField>,

    // -- Feed panel --
    pub focus: Focus,
    /// Index into the sorted view.
    pub selected: usize,
    pub expanded: HashSet<String>,

    // -- Chrome --
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,
    pub highlight_handle: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(client: Arc<ApiClient>, config: &Config) -> anyhow::Result<Self> {
        let sources = config.sources()?;
        let sort = config.sort()?;
        let api_key = config.openai_key();
        let profile = default_profile();
        let sidebar = SidebarDraft::new(&profile, api_key.as_ref(), &sources, sort);

        Ok(Self {
            client,
            user_id: config.user_id.clone(),
            highlight_delay: Duration::from_millis(config.highlight_ms),
            palette: config.theme().palette(),
            feed: FeedState::new(config.page_size),
            profile,
            api_key,
            active_sources: sources,
            sort,
            sidebar,
            sidebar_rows: SidebarRow::all(),
            sidebar_cursor: 0,
            editing: None,
            focus: Focus::Feed,
            selected: 0,
            expanded: HashSet::new(),
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            highlight_handle: None,
        })
    }

    // ========================================================================
    // Derived Views
    // ========================================================================

    /// Feed items in display order.
    pub fn sorted_items(&self) -> Vec<&FeedItem> {
        self.feed.sorted(self.sort)
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.sorted_items().get(self.selected).copied()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn sidebar_row(&self) -> Option<SidebarRow> {
        self.sidebar_rows.get(self.sidebar_cursor).copied()
    }

    /// Refresh is blocked only while a reset is in flight.
    pub fn can_refresh(&self) -> bool {
        self.feed.load_state() != LoadState::LoadingInitial
    }

    pub fn can_apply(&self) -> bool {
        !self.sidebar.is_applying() && self.can_refresh()
    }

    // ========================================================================
    // Fetch Coordination
    // ========================================================================

    fn job(&self, ticket: FetchTicket) -> FetchJob {
        FetchJob {
            ticket,
            user_id: self.user_id.clone(),
            sources: self.active_sources.clone(),
            limit: self.feed.page_size(),
            api_key: self
                .api_key
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_owned())),
        }
    }

    /// Issue a reset fetch with the current sources and key.
    pub fn request_reset(&mut self) -> FetchJob {
        let ticket = self.feed.begin_reset();
        self.needs_redraw = true;
        self.job(ticket)
    }

    /// Issue an incremental fetch, or `None` if that is not possible now.
    pub fn request_more(&mut self) -> Option<FetchJob> {
        let ticket = self.feed.begin_more()?;
        self.needs_redraw = true;
        Some(self.job(ticket))
    }

    /// Fold a finished fetch into the session.
    ///
    /// Returns the highlight generation to schedule a clear for, if the
    /// response was a reset.
    pub fn handle_feed_loaded(
        &mut self,
        ticket: FetchTicket,
        result: Result<FeedResponse, ApiError>,
    ) -> Option<u64> {
        let outcome = self.feed.complete(ticket, result, Utc::now());
        self.needs_redraw = true;

        match outcome {
            FetchOutcome::Stale => None,
            FetchOutcome::Failed => {
                self.set_status("Feed request failed");
                None
            }
            FetchOutcome::Replaced {
                count,
                highlight,
                profile,
            } => {
                if let Some(profile) = profile {
                    self.adopt_profile(profile);
                }
                self.selected = 0;
                let ids: HashSet<&str> = self.feed.items().iter().map(|i| i.id.as_str()).collect();
                self.expanded.retain(|id| ids.contains(id.as_str()));
                self.set_status(format!("{} items loaded", count));
                Some(highlight)
            }
            FetchOutcome::Appended { added, profile } => {
                if let Some(profile) = profile {
                    self.adopt_profile(profile);
                }
                self.set_status(format!("{} more items", added));
                None
            }
        }
    }

    fn adopt_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
        self.sidebar.sync_from(
            &self.profile,
            self.api_key.as_ref(),
            &self.active_sources,
            self.sort,
        );
    }

    /// Clear the new-item highlight for `generation` if it is still current.
    pub fn handle_highlight_expired(&mut self, generation: u64) {
        if self.feed.expire_highlight(generation) {
            tracing::debug!(generation, "New-item highlight cleared");
            self.needs_redraw = true;
        }
    }

    // ========================================================================
    // Sidebar Apply
    // ========================================================================

    /// Snapshot the sidebar for submission, unless an apply or reset is
    /// already running.
    pub fn begin_apply(&mut self) -> Option<ApplyRequest> {
        if !self.can_apply() {
            return None;
        }
        self.editing = None;
        let request = self.sidebar.begin_apply()?;
        tracing::info!(
            sources = %SourceId::join(&request.sources),
            sort = %request.sort,
            "Applying sidebar settings"
        );
        self.needs_redraw = true;
        Some(request)
    }

    /// Adopt the applied settings and issue the follow-up reset fetch built
    /// from the new key and sources.
    pub fn apply_settings(&mut self, applied: AppliedSettings) -> FetchJob {
        if applied.confirmed {
            self.set_status("Profile updated");
        } else {
            self.set_status("Profile update failed, using local settings");
        }

        self.profile = applied.profile;
        self.api_key = applied.api_key;
        self.active_sources = applied.sources;
        self.sort = applied.sort;
        self.selected = 0;

        self.sidebar.finish_apply();
        self.sidebar.sync_from(
            &self.profile,
            self.api_key.as_ref(),
            &self.active_sources,
            self.sort,
        );

        self.request_reset()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn nav_down(&mut self) {
        match self.focus {
            Focus::Feed => {
                let len = self.feed.items().len();
                if self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            Focus::Sidebar => {
                if self.sidebar_cursor + 1 < self.sidebar_rows.len() {
                    self.sidebar_cursor += 1;
                }
            }
        }
    }

    pub fn nav_up(&mut self) {
        match self.focus {
            Focus::Feed => self.selected = self.selected.saturating_sub(1),
            Focus::Sidebar => self.sidebar_cursor = self.sidebar_cursor.saturating_sub(1),
        }
    }

    pub fn toggle_focus(&mut self) {
        self.editing = None;
        self.focus = match self.focus {
            Focus::Feed => Focus::Sidebar,
            Focus::Sidebar => Focus::Feed,
        };
    }

    /// Expand or collapse the selected card.
    pub fn toggle_expanded(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id.clone()) else {
            return;
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn clamp_selection(&mut self) {
        let len = self.feed.items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Source;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn app() -> App {
        let client = Arc::new(ApiClient::new("http://localhost:1").unwrap());
        App::new(client, &Config::default()).unwrap()
    }

    fn response(ids: &[&str]) -> FeedResponse {
        FeedResponse {
            items: ids
                .iter()
                .map(|id| FeedItem {
                    id: id.to_string(),
                    source: Source::SamGov,
                    ..Default::default()
                })
                .collect(),
            total: ids.len() as u64,
            has_more: true,
            source_counts: HashMap::new(),
            profile: None,
        }
    }

    #[test]
    fn test_new_uses_config_defaults() {
        let app = app();
        assert_eq!(app.active_sources, SourceId::ALL.to_vec());
        assert_eq!(app.sort, SortMode::Relevance);
        assert_eq!(app.profile, default_profile());
        assert_eq!(app.highlight_delay, Duration::from_millis(4000));
        assert_eq!(app.feed.page_size(), 15);
    }

    #[test]
    fn test_reset_job_carries_session_settings() {
        let mut app = app();
        let job = app.request_reset();
        assert_eq!(job.ticket.offset, 0);
        assert_eq!(job.limit, 15);
        assert_eq!(job.user_id, "default");
        assert_eq!(job.sources, SourceId::ALL.to_vec());
        assert!(!app.can_refresh());
        assert!(!app.can_apply());
    }

    #[test]
    fn test_feed_loaded_returns_highlight_and_adopts_profile() {
        let mut app = app();
        let job = app.request_reset();
        let mut resp = response(&["a", "b"]);
        resp.profile = Some(UserProfile::local("radar", "sensors"));

        let generation = app.handle_feed_loaded(job.ticket, Ok(resp));
        assert_eq!(generation, Some(job.ticket.seq));
        assert_eq!(app.profile.keywords, "radar");
        assert_eq!(app.sidebar.keywords(), "radar");
        assert!(app.feed.is_new("a"));

        app.handle_highlight_expired(job.ticket.seq);
        assert!(!app.feed.is_new("a"));
    }

    #[test]
    fn test_more_has_no_highlight() {
        let mut app = app();
        let job = app.request_reset();
        app.handle_feed_loaded(job.ticket, Ok(response(&["a"])));
        let more = app.request_more().unwrap();
        assert_eq!(more.ticket.offset, 15);
        assert_eq!(app.handle_feed_loaded(more.ticket, Ok(response(&["b"]))), None);
        assert_eq!(app.feed.items().len(), 2);
    }

    #[test]
    fn test_apply_settings_adopts_and_resets() {
        let mut app = app();
        let request = app.begin_apply().unwrap();
        assert!(app.sidebar.is_applying());

        let job = app.apply_settings(AppliedSettings {
            profile: UserProfile::local(request.keywords, request.focus),
            api_key: Some(SecretString::from("sk-new".to_string())),
            sources: vec![SourceId::Grants],
            sort: SortMode::Amount,
            confirmed: false,
        });

        assert_eq!(job.sources, vec![SourceId::Grants]);
        assert_eq!(
            job.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-new".to_string())
        );
        assert_eq!(app.sort, SortMode::Amount);
        assert!(!app.sidebar.is_applying());
        assert!(!app.sidebar.is_dirty());
        assert_eq!(app.sidebar.sources(), &[SourceId::Grants]);
    }

    #[test]
    fn test_begin_apply_blocked_while_resetting() {
        let mut app = app();
        let _job = app.request_reset();
        assert!(app.begin_apply().is_none());
        assert!(!app.sidebar.is_applying());
    }

    #[test]
    fn test_toggle_expanded_follows_sorted_selection() {
        let mut app = app();
        let job = app.request_reset();
        let mut resp = response(&["low", "high"]);
        resp.items[1].relevance_score = Some(90.0);
        app.handle_feed_loaded(job.ticket, Ok(resp));

        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("high"));
        app.toggle_expanded();
        assert!(app.is_expanded("high"));
        app.toggle_expanded();
        assert!(!app.is_expanded("high"));
    }

    #[test]
    fn test_nav_bounds() {
        let mut app = app();
        app.nav_up();
        assert_eq!(app.selected, 0);
        app.nav_down();
        assert_eq!(app.selected, 0);

        app.toggle_focus();
        assert_eq!(app.focus, Focus::Sidebar);
        for _ in 0..100 {
            app.nav_down();
        }
        assert_eq!(app.sidebar_row(), Some(SidebarRow::Apply));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_expires() {
        let mut app = app();
        app.set_status("hello");
        assert!(!app.clear_expired_status());
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
