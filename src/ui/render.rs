//! Render functions for the TUI.
//!
//! Layout: settings sidebar on the left; top bar, error banner, card list,
//! footer and status bar stacked on the right.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::feed_list::{self, spinner, time_label};
use super::{sidebar_panel, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 70;
pub(super) const MIN_HEIGHT: u16 = 12;

const SIDEBAR_WIDTH: u16 = 36;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(area);

    sidebar_panel::render(f, app, columns[0]);
    render_main(f, app, columns[1]);
}

fn render_main(f: &mut Frame, app: &App, area: Rect) {
    let banner_height = if app.feed.error().is_some() { 1 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_top_bar(f, app, rows[0]);
    if let Some(error) = app.feed.error() {
        let banner = Line::from(vec![
            Span::styled(" ⚠ Backend offline. ", app.palette.error_banner),
            Span::styled(format!("{} ", error), app.palette.error_banner),
        ]);
        f.render_widget(Paragraph::new(banner).style(app.palette.error_banner), rows[1]);
    }
    feed_list::render(f, app, rows[2]);
    feed_list::render_footer(f, app, rows[3]);
    status::render(f, app, rows[4]);
}

fn render_top_bar(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let mut spans = Vec::with_capacity(4);
    if app.feed.load_state() == crate::feed::LoadState::LoadingInitial {
        spans.push(Span::styled(
            format!(" {} Loading…", spinner(app.spinner_frame)),
            palette.top_bar,
        ));
    } else {
        spans.push(Span::styled(
            format!(" {} items", app.feed.items().len()),
            palette.card_title,
        ));
        let new_count = app.feed.new_count();
        if new_count > 0 {
            spans.push(Span::styled(format!("  {} new", new_count), palette.card_new));
        }
        let updated = time_label(app.feed.last_updated());
        if !updated.is_empty() {
            spans.push(Span::styled(format!("  {}", updated), palette.muted));
        }
    }
    spans.push(Span::styled(
        format!("  sorted by {}", app.sort.label()),
        palette.muted,
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
