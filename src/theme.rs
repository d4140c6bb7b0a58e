//! Semantic color roles for the dashboard.
//!
//! `ThemeVariant` selects between the Dark and Light palettes. Source and
//! score colors come from `card` and are the same in both variants.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Feed cards --
    pub card_title: Style,
    pub card_selected: Style,
    pub card_new: Style,
    pub card_meta: Style,
    pub card_body: Style,
    pub chip: Style,
    pub summary_fallback: Style,
    pub link: Style,
    pub urgent: Style,
    pub demo_tag: Style,

    // -- Sidebar --
    pub brand: Style,
    pub section_label: Style,
    pub field: Style,
    pub field_editing: Style,
    pub row_selected: Style,
    pub muted: Style,
    pub apply_button: Style,
    pub apply_dirty: Style,

    // -- Chrome --
    pub top_bar: Style,
    pub error_banner: Style,
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        let gray = Color::Rgb(0x76, 0x83, 0x90);
        Self {
            card_title: Style::default().add_modifier(Modifier::BOLD),
            card_selected: Style::default().bg(Color::Rgb(0x1C, 0x23, 0x2B)),
            card_new: Style::default().fg(Color::Rgb(0x4A, 0xFF, 0x91)),
            card_meta: Style::default().fg(gray),
            card_body: Style::default().fg(Color::Gray),
            chip: Style::default().fg(Color::Gray).bg(Color::Rgb(0x22, 0x27, 0x2E)),
            summary_fallback: Style::default().fg(gray).add_modifier(Modifier::ITALIC),
            link: Style::default()
                .fg(Color::Rgb(0x4A, 0x9E, 0xFF))
                .add_modifier(Modifier::UNDERLINED),
            urgent: Style::default()
                .fg(Color::Rgb(0xFF, 0x6B, 0x4A))
                .add_modifier(Modifier::BOLD),
            demo_tag: Style::default().fg(Color::Black).bg(Color::Yellow),

            brand: Style::default()
                .fg(Color::Rgb(0x4A, 0x9E, 0xFF))
                .add_modifier(Modifier::BOLD),
            section_label: Style::default().fg(gray).add_modifier(Modifier::BOLD),
            field: Style::default().fg(Color::White),
            field_editing: Style::default().fg(Color::Yellow),
            row_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            muted: Style::default().fg(Color::DarkGray),
            apply_button: Style::default().fg(Color::White).bg(Color::Rgb(0x22, 0x27, 0x2E)),
            apply_dirty: Style::default()
                .fg(Color::Black)
                .bg(Color::Rgb(0x4A, 0x9E, 0xFF))
                .add_modifier(Modifier::BOLD),

            top_bar: Style::default().fg(Color::Gray),
            error_banner: Style::default().fg(Color::White).bg(Color::Red),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Cyan),
        }
    }

    fn light() -> Self {
        Self {
            card_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            card_selected: Style::default().bg(Color::Rgb(0xE4, 0xEA, 0xF1)),
            card_new: Style::default().fg(Color::Rgb(0x1A, 0x8F, 0x4E)),
            card_meta: Style::default().fg(Color::DarkGray),
            card_body: Style::default().fg(Color::Black),
            chip: Style::default().fg(Color::Black).bg(Color::Rgb(0xE4, 0xE4, 0xE4)),
            summary_fallback: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            urgent: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            demo_tag: Style::default().fg(Color::Black).bg(Color::Yellow),

            brand: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            section_label: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            field: Style::default().fg(Color::Black),
            field_editing: Style::default().fg(Color::Magenta),
            row_selected: Style::default().bg(Color::Blue).fg(Color::White),
            muted: Style::default().fg(Color::DarkGray),
            apply_button: Style::default().fg(Color::Black).bg(Color::Rgb(0xE4, 0xE4, 0xE4)),
            apply_dirty: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            top_bar: Style::default().fg(Color::DarkGray),
            error_banner: Style::default().fg(Color::White).bg(Color::Red),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
        }
    }
}
