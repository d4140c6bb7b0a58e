use crate::app::{App, Focus};
use crate::card::{CardView, SummaryLine, KEYWORD_FALLBACK_NOTICE};
use crate::feed::LoadState;
use crate::theme::ColorPalette;
use crate::util::{single_line, strip_control_chars, truncate_to_width, wrap_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Render the feed card list
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let border_style = if app.focus == Focus::Feed {
        palette.panel_border_focused
    } else {
        palette.panel_border
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Feed ");

    if app.feed.load_state() == LoadState::LoadingInitial {
        let msg = Paragraph::new(format!("\n{} Loading…", spinner(app.spinner_frame)))
            .alignment(Alignment::Center)
            .style(palette.muted)
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    let sorted = app.sorted_items();
    if sorted.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("◈", palette.brand)),
            Line::from("No items found for your current filters."),
            Line::from(Span::styled(
                "Adjust keywords or enable more sources in the sidebar.",
                palette.muted,
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    // Borders plus the highlight symbol.
    let width = area.width.saturating_sub(4) as usize;
    let now = Utc::now();

    let items: Vec<ListItem> = sorted
        .iter()
        .map(|item| {
            let card = CardView::new(item, app.feed.is_new(&item.id), now);
            ListItem::new(card_text(&card, app.is_expanded(&item.id), width, palette))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(palette.card_selected)
        .highlight_symbol("▌ ");

    let mut state = ListState::default().with_selected(Some(app.selected.min(sorted.len() - 1)));
    f.render_stateful_widget(list, area, &mut state);
}

/// Footer under the list: load-more hint or end marker.
pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let line = match app.feed.load_state() {
        LoadState::LoadingInitial => Line::from(""),
        LoadState::LoadingMore => Line::from(Span::styled(
            format!("{} Loading…", spinner(app.spinner_frame)),
            palette.muted,
        )),
        LoadState::Idle if app.feed.items().is_empty() => Line::from(""),
        LoadState::Idle if app.feed.has_more() => Line::from(vec![
            Span::styled("Load more ↓ ", palette.field),
            Span::styled("[m]", palette.muted),
        ]),
        LoadState::Idle => Line::from(Span::styled("— end of feed —", palette.muted)),
    };
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

pub(super) fn time_label(updated: Option<DateTime<Utc>>) -> String {
    match updated {
        Some(ts) => format!("updated {}", ts.format("%H:%M:%S")),
        None => String::new(),
    }
}

fn card_text<'a>(
    card: &CardView<'a>,
    expanded: bool,
    width: usize,
    palette: &ColorPalette,
) -> Text<'a> {
    let item = card.item;
    let mut lines: Vec<Line> = Vec::with_capacity(8);

    // Header: source badge, NEW marker, match score, demo tag
    let mut header = vec![Span::styled(
        format!("{} {}", card.meta.icon, card.meta.label),
        Style::default()
            .fg(card.meta.color)
            .add_modifier(Modifier::BOLD),
    )];
    if card.is_new {
        header.push(Span::styled("  NEW", palette.card_new.add_modifier(Modifier::BOLD)));
    }
    if card.shows_score() {
        header.push(Span::raw("  "));
        header.push(Span::styled(
            format!("MATCH {}", card.score_label()),
            Style::default().fg(card.tier.color()),
        ));
    }
    if item.is_mock {
        header.push(Span::raw("  "));
        header.push(Span::styled(" DEMO DATA ", palette.demo_tag));
    }
    lines.push(Line::from(header));

    let title = single_line(&strip_control_chars(&item.title));
    lines.push(Line::from(Span::styled(
        truncate_to_width(&title, width).into_owned(),
        palette.card_title,
    )));

    match card.summary {
        SummaryLine::Ai(text) => {
            let text = single_line(&strip_control_chars(text));
            lines.push(Line::from(Span::styled(
                truncate_to_width(&text, width).into_owned(),
                palette.card_body,
            )));
        }
        SummaryLine::KeywordFallback => {
            lines.push(Line::from(Span::styled(
                truncate_to_width(KEYWORD_FALLBACK_NOTICE, width).into_owned(),
                palette.summary_fallback,
            )));
        }
        SummaryLine::Hidden => {}
    }

    if !card.chips.is_empty() {
        let mut spans = Vec::with_capacity(card.chips.len() * 2);
        for (i, chip) in card.chips.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(
                format!(" {} ", strip_control_chars(chip)),
                palette.chip,
            ));
        }
        lines.push(Line::from(spans));
    }

    let mut dates = Vec::new();
    if let Some(posted) = &card.posted {
        dates.push(Span::styled("POSTED ", palette.muted));
        dates.push(Span::styled(posted.clone(), palette.card_meta));
    }
    if let Some(due) = card.due_label() {
        if !dates.is_empty() {
            dates.push(Span::raw("   "));
        }
        dates.push(Span::styled("DUE ", palette.muted));
        let style = if card.urgent {
            palette.urgent
        } else {
            palette.card_meta
        };
        dates.push(Span::styled(due, style));
    }
    if !dates.is_empty() {
        lines.push(Line::from(dates));
    }

    if expanded {
        if let Some(desc) = card.description() {
            lines.push(Line::from(""));
            for row in wrap_to_width(&strip_control_chars(&desc), width) {
                lines.push(Line::from(Span::styled(row, palette.card_body)));
            }
        }
        if !item.url.is_empty() {
            lines.push(Line::from(Span::styled(card.link_label(), palette.link)));
        }
    }

    lines.push(Line::from(""));
    Text::from(lines)
}
