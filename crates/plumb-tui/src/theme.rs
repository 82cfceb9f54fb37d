use ratatui::{
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders},
};

// ── Color palette ──────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(130, 170, 255);
pub const ERROR: Color = Color::Rgb(240, 100, 100);
pub const WARNING: Color = Color::Rgb(240, 200, 80);

pub const TEXT_PRIMARY: Color = Color::Rgb(220, 220, 230);
pub const TEXT_MUTED: Color = Color::Rgb(90, 90, 110);

pub const BORDER: Color = Color::Rgb(60, 60, 80);

// ── Helpers ────────────────────────────────────────────────────────────

/// Build a themed pane block with rounded borders and a title.
pub fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(format!(" {title} "))
        .title_style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
}
