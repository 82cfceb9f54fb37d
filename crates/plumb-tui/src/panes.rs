use crate::theme;
use plumb_core::PreviewEvent;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub const SPINNER_FRAMES: &[&str] = &[
    "\u{280b}", "\u{2819}", "\u{2839}", "\u{2838}", "\u{283c}", "\u{2834}", "\u{2826}",
    "\u{2827}", "\u{2807}", "\u{280f}",
];

/// One preview pane: the truncated bytes of the current run plus the
/// indicators the supervisor reports for it.
pub struct PreviewPane {
    title: &'static str,
    /// Truncated output of the current run, appended chunk by chunk.
    content: Vec<u8>,
    /// A run is in flight (drives the loading spinner).
    busy: bool,
    /// Deny-list token that suppressed the run, if any.
    suppressed: Option<String>,
}

impl PreviewPane {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            content: Vec::new(),
            busy: false,
            suppressed: None,
        }
    }

    /// Apply one supervisor event addressed to this pane.
    pub fn apply(&mut self, event: &PreviewEvent) {
        match event {
            PreviewEvent::RunStarted { .. } => {
                self.content.clear();
                self.suppressed = None;
                self.busy = true;
            }
            PreviewEvent::Chunk { bytes, .. } => {
                self.content.extend_from_slice(bytes);
            }
            PreviewEvent::RunFinished { .. } => {
                self.busy = false;
            }
            PreviewEvent::Suppressed { token, .. } => {
                self.content.clear();
                self.busy = false;
                self.suppressed = Some(token.clone());
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Render the pane. `spinner_frame` indexes the loading animation.
    pub fn render(&self, frame: &mut Frame, area: Rect, spinner_frame: usize) {
        let title = if self.busy {
            format!(
                "{} {}",
                self.title,
                SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()]
            )
        } else if let Some(ref token) = self.suppressed {
            format!("{} [skipped: {token}]", self.title)
        } else {
            self.title.to_string()
        };

        let block = theme::styled_block(&title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(ref token) = self.suppressed {
            let notice = Paragraph::new(Line::from(Span::styled(
                format!("preview disabled for '{token}'"),
                Style::default().fg(theme::WARNING),
            )));
            frame.render_widget(notice, inner);
            return;
        }

        // Output is not guaranteed to be UTF-8; render lossily and leave
        // wrapping off so long lines clip like the original.
        let text = String::from_utf8_lossy(&self.content);
        let lines: Vec<Line> = text
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme::TEXT_PRIMARY))))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
