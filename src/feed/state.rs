use crate::api::{ApiClient, ApiError, FeedItem, FeedQuery, FeedResponse, SourceId, UserProfile};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};

use super::sort::{sorted_view, SortMode};

/// Banner text shown when a feed request fails.
pub const BACKEND_UNREACHABLE: &str =
    "Cannot reach the backend. Make sure the API server is running.";

/// What the feed is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
}

/// Whether a fetch replaces the list or extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Reset,
    More,
}

/// Identity of an issued fetch. Only the latest sequence number is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub mode: FetchMode,
    pub offset: usize,
}

/// A fully-resolved feed request, owned so it can move into a task.
#[derive(Debug)]
pub struct FetchJob {
    pub ticket: FetchTicket,
    pub user_id: String,
    pub sources: Vec<SourceId>,
    pub limit: usize,
    pub api_key: Option<SecretString>,
}

impl FetchJob {
    pub async fn run(&self, client: &ApiClient) -> Result<FeedResponse, ApiError> {
        client
            .fetch_feed(&FeedQuery {
                user_id: &self.user_id,
                sources: &self.sources,
                limit: self.limit,
                offset: self.ticket.offset,
                api_key: self.api_key.as_ref(),
            })
            .await
    }
}

/// Result of feeding a response back into the state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A newer request was issued since this one; nothing changed.
    Stale,
    /// Reset applied. The new-item highlight belongs to `highlight`, and the
    /// server's profile is passed through when present.
    Replaced {
        count: usize,
        highlight: u64,
        profile: Option<UserProfile>,
    },
    /// Page appended. `added` excludes ids already in the list.
    Appended {
        added: usize,
        profile: Option<UserProfile>,
    },
    /// Request failed; the sticky error is set and the list is unchanged.
    Failed,
}

/// Authoritative feed data for one session.
#[derive(Debug, Default)]
pub struct FeedState {
    items: Vec<FeedItem>,
    offset: usize,
    page_size: usize,
    has_more: bool,
    source_counts: HashMap<String, u64>,
    new_ids: HashSet<String>,
    highlight_generation: u64,
    last_updated: Option<DateTime<Utc>>,
    load: LoadState,
    error: Option<String>,
    latest_seq: u64,
}

impl FeedState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Default::default()
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn sorted(&self, mode: SortMode) -> Vec<&FeedItem> {
        sorted_view(&self.items, mode)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn source_counts(&self) -> &HashMap<String, u64> {
        &self.source_counts
    }

    pub fn source_count(&self, id: SourceId) -> Option<u64> {
        self.source_counts.get(id.as_str()).copied()
    }

    pub fn is_new(&self, id: &str) -> bool {
        self.new_ids.contains(id)
    }

    pub fn new_count(&self) -> usize {
        self.new_ids.len()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn load_state(&self) -> LoadState {
        self.load
    }

    pub fn is_loading(&self) -> bool {
        self.load != LoadState::Idle
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether "load more" is actionable right now.
    pub fn can_load_more(&self) -> bool {
        self.has_more && self.load == LoadState::Idle
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn next_seq(&mut self) -> u64 {
        self.latest_seq = self.latest_seq.wrapping_add(1);
        self.latest_seq
    }

    /// Start a reset fetch at offset 0. Any in-flight request becomes stale.
    pub fn begin_reset(&mut self) -> FetchTicket {
        let seq = self.next_seq();
        self.load = LoadState::LoadingInitial;
        tracing::debug!(seq, "Reset fetch issued");
        FetchTicket {
            seq,
            mode: FetchMode::Reset,
            offset: 0,
        }
    }

    /// Start an incremental fetch at the current offset.
    ///
    /// Returns `None` (and changes nothing) when there is no next page or a
    /// request is already in flight.
    pub fn begin_more(&mut self) -> Option<FetchTicket> {
        if !self.can_load_more() {
            tracing::trace!(
                has_more = self.has_more,
                load = ?self.load,
                "Load more ignored"
            );
            return None;
        }
        let seq = self.next_seq();
        self.load = LoadState::LoadingMore;
        tracing::debug!(seq, offset = self.offset, "Incremental fetch issued");
        Some(FetchTicket {
            seq,
            mode: FetchMode::More,
            offset: self.offset,
        })
    }

    /// Apply the response for `ticket`, stamped with `now`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<FeedResponse, ApiError>,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        if ticket.seq != self.latest_seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "Discarding stale feed response"
            );
            return FetchOutcome::Stale;
        }
        self.load = LoadState::Idle;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, mode = ?ticket.mode, "Feed fetch failed");
                self.error = Some(BACKEND_UNREACHABLE.to_string());
                return FetchOutcome::Failed;
            }
        };

        self.error = None;
        self.has_more = response.has_more;
        self.source_counts = response.source_counts;
        self.last_updated = Some(now);

        match ticket.mode {
            FetchMode::Reset => {
                self.new_ids = response.items.iter().map(|i| i.id.clone()).collect();
                self.highlight_generation = ticket.seq;
                self.items = dedup_by_id(response.items);
                self.offset = self.page_size;
                tracing::info!(items = self.items.len(), has_more = self.has_more, "Feed replaced");
                FetchOutcome::Replaced {
                    count: self.items.len(),
                    highlight: ticket.seq,
                    profile: response.profile,
                }
            }
            FetchMode::More => {
                let mut seen: HashSet<String> =
                    self.items.iter().map(|i| i.id.clone()).collect();
                let before = self.items.len();
                self.items.extend(
                    response
                        .items
                        .into_iter()
                        .filter(|item| seen.insert(item.id.clone())),
                );
                let added = self.items.len() - before;
                self.offset += self.page_size;
                tracing::info!(added, total = self.items.len(), offset = self.offset, "Feed page appended");
                FetchOutcome::Appended {
                    added,
                    profile: response.profile,
                }
            }
        }
    }

    /// Clear the new-item highlight if it still belongs to `generation`.
    ///
    /// Returns true if anything was cleared.
    pub fn expire_highlight(&mut self, generation: u64) -> bool {
        if generation != self.highlight_generation || self.new_ids.is_empty() {
            return false;
        }
        self.new_ids.clear();
        true
    }
}

/// Keep the first occurrence of each id.
fn dedup_by_id(items: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
