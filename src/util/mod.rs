//! Utility functions shared by the dashboard and the CLI.
//!
//! - **Formatting**: relative dates, day counts and compact currency
//! - **Text processing**: width-aware truncation and control-char stripping
//! - **URL checks**: validation before opening an item link
//!
//! # Examples
//!
//! ```
//! use govfeed::util::{fmt_money, truncate_to_width};
//!
//! assert_eq!(fmt_money(Some(1_500_000.0)), "$1.5M");
//! assert_eq!(truncate_to_width("Counter-UAS detection", 8), "Counter…");
//! ```

mod format;
mod links;
mod text;

pub use format::{days_until, fmt_money, fmt_rel_date, is_urgent, parse_date, sort_timestamp};
pub use links::validate_url_for_open;
pub use text::{
    display_width, excerpt, single_line, strip_control_chars, truncate_to_width, wrap_to_width,
};
