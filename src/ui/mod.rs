//! Terminal dashboard.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Task spawning and the highlight timer
//! - `render` - Layout and top bar
//! - `feed_list` - Card list and footer
//! - `sidebar_panel` - Settings sidebar
//! - `status` - Status bar

mod events;
mod feed_list;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod sidebar_panel;
mod status;

pub use loop_runner::{run, Action};
