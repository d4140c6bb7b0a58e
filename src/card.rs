//! Presentation model for a single feed entry.
//!
//! `CardView` is derived from a `FeedItem` on every render and holds no
//! state of its own; the expand/collapse toggle lives in `App`.

use crate::api::{FeedItem, Source, SourceId};
use crate::util::{days_until, excerpt, fmt_money, fmt_rel_date, is_urgent};
use chrono::{DateTime, Utc};
use ratatui::style::Color;

/// Longest description shown when a card is expanded.
pub const DESCRIPTION_LIMIT: usize = 800;

/// Notice shown when an item was scored by keywords rather than the AI ranker.
pub const KEYWORD_FALLBACK_NOTICE: &str =
    "Keyword match — add OpenAI key in sidebar for AI summaries";

// ============================================================================
// Source Styling
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMeta {
    pub color: Color,
    pub label: &'static str,
    pub icon: &'static str,
}

const NEUTRAL: SourceMeta = SourceMeta {
    color: Color::Rgb(0x88, 0x88, 0x88),
    label: "SOURCE",
    icon: "◆",
};

impl SourceMeta {
    pub fn for_source(source: &Source) -> Self {
        match source {
            Source::SamGov => Self {
                color: Color::Rgb(0x4A, 0x9E, 0xFF),
                label: "CONTRACT OPP",
                icon: "◈",
            },
            Source::UsaSpending => Self {
                color: Color::Rgb(0x4A, 0xFF, 0x91),
                label: "AWARD",
                icon: "◉",
            },
            Source::GrantsGov => Self {
                color: Color::Rgb(0xC0, 0x84, 0xFC),
                label: "GRANT",
                icon: "◇",
            },
            Source::Other(_) => NEUTRAL,
        }
    }

    /// Sidebar styling for a short source id.
    pub fn for_id(id: SourceId) -> Self {
        Self::for_source(&id.source())
    }
}

// ============================================================================
// Relevance Tier
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Medium,
    Neutral,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 55.0 {
            Self::Medium
        } else {
            Self::Neutral
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::High => Color::Rgb(0x4A, 0xFF, 0x91),
            Self::Medium => Color::Rgb(0xFF, 0xD8, 0x4A),
            Self::Neutral => Color::Rgb(0x76, 0x83, 0x90),
        }
    }
}

/// The summary row under the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLine<'a> {
    Ai(&'a str),
    KeywordFallback,
    Hidden,
}

// ============================================================================
// Card View
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CardView<'a> {
    pub item: &'a FeedItem,
    pub meta: SourceMeta,
    pub is_new: bool,
    pub score: f64,
    pub tier: ScoreTier,
    pub summary: SummaryLine<'a>,
    pub chips: Vec<String>,
    pub posted: Option<String>,
    pub due: Option<String>,
    pub days_left: Option<i64>,
    pub urgent: bool,
}

impl<'a> CardView<'a> {
    pub fn new(item: &'a FeedItem, is_new: bool, now: DateTime<Utc>) -> Self {
        let score = item.score();
        let days_left = days_until(&item.deadline, now);

        let summary = match item.summary() {
            Some(text) => SummaryLine::Ai(text),
            None if score > 0.0 => SummaryLine::KeywordFallback,
            None => SummaryLine::Hidden,
        };

        let posted = (!item.posted_date.is_empty()).then(|| fmt_rel_date(&item.posted_date, now));
        let due = (!item.deadline.is_empty()).then(|| fmt_rel_date(&item.deadline, now));

        Self {
            item,
            meta: SourceMeta::for_source(&item.source),
            is_new,
            score,
            tier: ScoreTier::from_score(score),
            summary,
            chips: chips(item),
            posted,
            due,
            days_left,
            urgent: is_urgent(days_left),
        }
    }

    /// Whether the MATCH badge is shown.
    pub fn shows_score(&self) -> bool {
        self.score > 0.0
    }

    /// `87`, or `87.5` for fractional scores.
    pub fn score_label(&self) -> String {
        if self.score.fract() == 0.0 {
            format!("{:.0}", self.score)
        } else {
            format!("{:.1}", self.score)
        }
    }

    /// Due date text with the urgency marker appended.
    pub fn due_label(&self) -> Option<String> {
        let due = self.due.as_ref()?;
        match (self.urgent, self.days_left) {
            (true, Some(days)) => Some(format!("{} ⚡ {}d", due, days)),
            _ => Some(due.clone()),
        }
    }

    /// Description excerpt for the expanded state, if there is one.
    pub fn description(&self) -> Option<std::borrow::Cow<'a, str>> {
        let desc = self.item.description.as_str();
        (!desc.trim().is_empty()).then(|| excerpt(desc, DESCRIPTION_LIMIT))
    }

    /// `view on sam →`
    pub fn link_label(&self) -> String {
        let host = self
            .item
            .source
            .name()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if host.is_empty() {
            "view source →".to_string()
        } else {
            format!("view on {} →", host)
        }
    }
}

fn chips(item: &FeedItem) -> Vec<String> {
    let mut chips = Vec::new();
    if !item.agency.is_empty() {
        chips.push(item.agency.clone());
    }
    if item.amount() > 0.0 {
        chips.push(fmt_money(item.award_amount));
    }
    if !item.naics.is_empty() {
        chips.push(format!("NAICS {}", item.naics));
    }
    if !item.set_aside.is_empty() && item.set_aside != "None" {
        chips.push(item.set_aside.clone());
    }
    if !item.contract_type.is_empty() {
        chips.push(item.contract_type.clone());
    }
    if let Some(recipient) = item.recipient.as_deref().filter(|r| !r.is_empty()) {
        if item.source == Source::UsaSpending {
            chips.push(format!("→ {}", recipient));
        }
    }
    chips
}
