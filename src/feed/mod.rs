//! Feed composition: the authoritative item list and its derived views.
//!
//! - [`state`] - reset/incremental fetch lifecycle, sequencing, highlight set
//! - [`sort`] - `SortMode` comparators and the sorted display view
//!
//! # Example
//!
//! ```ignore
//! let mut feed = FeedState::new(15);
//! let ticket = feed.begin_reset();
//! let result = job.run(&client).await;
//! feed.complete(ticket, result, Utc::now());
//! for item in feed.sorted(SortMode::Date) { /* render */ }
//! ```

mod sort;
mod state;

pub use sort::{sorted_view, SortMode, UnknownSortMode};
pub use state::{
    FeedState, FetchJob, FetchMode, FetchOutcome, FetchTicket, LoadState, BACKEND_UNREACHABLE,
};
