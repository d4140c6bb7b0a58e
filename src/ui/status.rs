use crate::app::{App, Focus};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.editing.is_some() {
        Cow::Borrowed("Type to edit | ENTER done (applies in keywords) | ESC leave | Ctrl+U clear")
    } else {
        match app.focus {
            Focus::Feed => Cow::Borrowed(
                "[j/k]move [enter]expand [o]pen [m]ore [r]efresh [Tab]sidebar [q]uit",
            ),
            Focus::Sidebar => Cow::Borrowed(
                "[j/k]move [enter]select [a]pply [r]efresh [Tab]feed [q]uit",
            ),
        }
    };

    f.render_widget(Paragraph::new(text).style(app.palette.status_bar), area);
}
