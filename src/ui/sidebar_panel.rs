use crate::app::{App, Focus};
use crate::card::SourceMeta;
use crate::sidebar::{DraftField, SidebarRow, QUICK_PROFILES};
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the settings sidebar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let focused = app.focus == Focus::Sidebar;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            palette.panel_border_focused
        } else {
            palette.panel_border
        });
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("⬡ GOVFEED", palette.brand),
        ]),
        Line::from(Span::styled("Defense & Gov Intelligence", palette.muted)),
    ];

    let mut cursor_line = 0usize;
    let mut section: Option<&'static str> = None;

    for (index, row) in app.sidebar_rows.iter().enumerate() {
        let heading = section_for(*row);
        if section != Some(heading) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(heading, palette.section_label)));
            section = Some(heading);
        }

        let selected = focused && index == app.sidebar_cursor;
        if selected {
            cursor_line = lines.len();
        }
        let marker = if selected { "▸ " } else { "  " };
        let mut line = row_line(app, *row, inner_width.saturating_sub(2));
        line.spans.insert(0, Span::raw(marker));
        if selected {
            line = line.style(palette.row_selected);
        }
        lines.push(line);

        if *row == SidebarRow::Field(DraftField::ApiKey) {
            lines.push(Line::from(Span::styled(
                format!("  {}", app.sidebar.key_hint()),
                palette.muted,
            )));
        }
    }

    // Keep the cursor row visible on short terminals.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = (cursor_line + 1).saturating_sub(visible);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    f.render_widget(paragraph, area);
}

fn section_for(row: SidebarRow) -> &'static str {
    match row {
        SidebarRow::Field(DraftField::Focus) => "YOUR FOCUS",
        SidebarRow::Field(DraftField::Keywords) => "SEARCH KEYWORDS",
        SidebarRow::Preset(_) => "QUICK PROFILES",
        SidebarRow::Source(_) => "SOURCES",
        SidebarRow::Sort(_) => "SORT BY",
        SidebarRow::Field(DraftField::ApiKey) => "OPENAI KEY",
        SidebarRow::Apply => "",
    }
}

fn row_line(app: &App, row: SidebarRow, width: usize) -> Line<'static> {
    let palette = &app.palette;
    let draft = &app.sidebar;
    match row {
        SidebarRow::Field(field) => {
            let editing = app.editing == Some(field);
            let style = if editing {
                palette.field_editing
            } else {
                palette.field
            };
            let value = match field {
                DraftField::ApiKey if draft.has_api_key() => "•".repeat(draft.api_key_len().min(24)),
                DraftField::ApiKey => String::new(),
                _ => draft.field(field).to_string(),
            };
            let placeholder = match field {
                DraftField::Focus => "e.g. AI-enabled ISR and targeting systems",
                DraftField::Keywords => "counter-UAS, autonomy, cyber...",
                DraftField::ApiKey => "sk-...",
            };
            let cursor = if editing { "▏" } else { "" };
            if value.is_empty() && !editing {
                Line::from(Span::styled(
                    truncate_to_width(placeholder, width).into_owned(),
                    palette.muted,
                ))
            } else {
                // Show the tail while typing so the cursor stays in view.
                let shown = if editing {
                    tail_to_width(&value, width.saturating_sub(1))
                } else {
                    truncate_to_width(&value, width).into_owned()
                };
                Line::from(vec![
                    Span::styled(shown, style),
                    Span::styled(cursor, style),
                ])
            }
        }
        SidebarRow::Preset(index) => {
            let label = QUICK_PROFILES.get(index).map(|p| p.label).unwrap_or_default();
            Line::from(Span::styled(format!("◦ {}", label), palette.field))
        }
        SidebarRow::Source(id) => {
            let meta = SourceMeta::for_id(id);
            let check = if draft.is_source_selected(id) { "[x]" } else { "[ ]" };
            let count = app
                .feed
                .source_count(id)
                .map(|c| c.to_string())
                .unwrap_or_else(|| "—".to_string());
            Line::from(vec![
                Span::styled(format!("{} ", check), palette.field),
                Span::styled(format!("{} ", meta.icon), Style::default().fg(meta.color)),
                Span::styled(format!("{:<12}", id.label()), palette.field),
                Span::styled(format!("{:>5}", count), Style::default().fg(meta.color)),
            ])
        }
        SidebarRow::Sort(mode) => {
            let on = draft.sort() == mode;
            let mark = if on { "●" } else { "○" };
            let style = if on { palette.field } else { palette.muted };
            Line::from(Span::styled(format!("{} {}", mark, mode.label()), style))
        }
        SidebarRow::Apply => {
            let style = if draft.is_dirty() || draft.is_applying() {
                palette.apply_dirty
            } else {
                palette.apply_button
            };
            Line::from(Span::styled(format!(" {} ", draft.apply_label()), style))
        }
    }
}

/// Last `width` columns of `s`.
fn tail_to_width(s: &str, width: usize) -> String {
    let mut used = 0;
    let mut start = s.len();
    for (idx, c) in s.char_indices().rev() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    s[start..].to_string()
}
