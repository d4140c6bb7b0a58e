//! govfeed: a terminal dashboard for government contract, award and grant
//! opportunities served by a ranking backend.
//!
//! The crate is split so that everything except `ui` runs without a
//! terminal:
//!
//! - [`api`] - typed client for the feed and profile endpoints
//! - [`feed`] - authoritative item list, pagination and sorting
//! - [`sidebar`] - draft settings reconciled against the session
//! - [`card`] - per-item presentation derived at render time
//! - [`app`] - session state tying the above together
//! - [`ui`] - ratatui event loop and widgets

pub mod api;
pub mod app;
pub mod card;
pub mod config;
pub mod feed;
pub mod sidebar;
pub mod theme;
pub mod ui;
pub mod util;
