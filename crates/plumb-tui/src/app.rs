use crate::input::{InputEvent, InputReader};
use crate::panes::PreviewPane;
use crate::theme;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use plumb_config::{Config, Layout};
use plumb_core::{ExecutionSupervisor, Pane, PreviewEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout as TermLayout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The original caps the prompt; anything longer is not a command line
/// someone composes interactively.
const MAX_INPUT_CHARS: usize = 200;

/// How the interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The user confirmed; the assembled command line as typed.
    Accepted(String),
    /// The user bailed out; nothing to emit or execute.
    Aborted,
}

/// Unified event type for the app event loop.
enum AppEvent {
    /// Terminal input.
    Input(InputEvent),
    /// Supervisor progress.
    Preview(PreviewEvent),
    /// Periodic tick for UI refresh.
    Tick,
}

/// Main application state: the prompt line plus the two preview panes.
pub struct App {
    supervisor: ExecutionSupervisor,
    preview_rx: mpsc::UnboundedReceiver<PreviewEvent>,
    view_rows: Arc<AtomicUsize>,
    layout: Layout,
    /// Prompt symbol: `"> "` with a TTY stdin, `"| "` with piped input.
    symbol: &'static str,
    /// Editable tail text.
    input: String,
    /// Byte offset of the cursor within `input`.
    cursor: usize,
    stdin_pane: PreviewPane,
    stdout_pane: PreviewPane,
    spinner_frame: usize,
    outcome: Option<AcceptOutcome>,
    started: bool,
}

impl App {
    pub fn new(config: Arc<Config>, stdin_bytes: Vec<u8>) -> Self {
        let symbol = if stdin_bytes.is_empty() { "> " } else { "| " };
        let layout = config.layout;
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = ExecutionSupervisor::new(config, stdin_bytes, tx);
        let input = supervisor.tail().to_string();
        let cursor = input.len();
        let view_rows = supervisor.view_rows();
        Self {
            supervisor,
            preview_rx: rx,
            view_rows,
            layout,
            symbol,
            input,
            cursor,
            stdin_pane: PreviewPane::new("stdin"),
            stdout_pane: PreviewPane::new("stdout"),
            spinner_frame: 0,
            outcome: None,
            started: false,
        }
    }

    /// Run the main event loop until the user accepts or aborts.
    pub async fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> Result<AcceptOutcome> {
        let mut input_reader = InputReader::spawn();
        let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(100));

        loop {
            terminal.draw(|frame| self.render(frame))?;

            // First previews start only after a draw has published the
            // visible row capacity.
            if !self.started {
                self.started = true;
                self.supervisor.start();
            }

            let events = self.collect_events(&mut input_reader, &mut tick_interval).await;
            for event in events {
                self.handle_event(event);
            }

            if let Some(outcome) = self.outcome.take() {
                self.supervisor.shutdown();
                return Ok(outcome);
            }
        }
    }

    /// Collect all pending events (non-blocking after the first tick).
    async fn collect_events(
        &mut self,
        reader: &mut InputReader,
        tick_interval: &mut tokio::time::Interval,
    ) -> Vec<AppEvent> {
        let mut events = Vec::new();

        tick_interval.tick().await;
        events.push(AppEvent::Tick);

        while let Some(event) = reader.try_recv() {
            events.push(AppEvent::Input(event));
        }

        while let Ok(event) = self.preview_rx.try_recv() {
            events.push(AppEvent::Preview(event));
        }

        events
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => {
                if self.stdin_pane.is_busy() || self.stdout_pane.is_busy() {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }

            AppEvent::Preview(preview) => {
                let pane = match &preview {
                    PreviewEvent::RunStarted { pane }
                    | PreviewEvent::Chunk { pane, .. }
                    | PreviewEvent::RunFinished { pane }
                    | PreviewEvent::Suppressed { pane, .. } => *pane,
                };
                match pane {
                    Pane::Stdin => self.stdin_pane.apply(&preview),
                    Pane::Stdout => self.stdout_pane.apply(&preview),
                }
            }

            AppEvent::Input(InputEvent::Resize) => {
                // ratatui picks up the new size on the next draw; new runs
                // sample the row capacity published then.
            }

            AppEvent::Input(InputEvent::Key(key)) => self.handle_key(key),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.outcome = Some(AcceptOutcome::Accepted(self.supervisor.full_text()));
            }
            KeyCode::Esc => {
                self.outcome = Some(AcceptOutcome::Aborted);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.outcome = Some(AcceptOutcome::Aborted);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.cursor = 0;
                self.supervisor.tail_changed(&self.input);
            }
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.delete_word();
                self.supervisor.tail_changed(&self.input);
            }
            KeyCode::Char('|') => {
                // Commit: the tail becomes a fixed stage, the field empties.
                self.supervisor.tail_changed(&self.input);
                self.supervisor.commit();
                self.input.clear();
                self.cursor = 0;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.input.chars().count() < MAX_INPUT_CHARS {
                    self.input.insert(self.cursor, c);
                    self.cursor += c.len_utf8();
                    self.supervisor.tail_changed(&self.input);
                }
            }
            KeyCode::Backspace => {
                if self.input.is_empty() {
                    // Retract: pull the last committed stage back into the
                    // editable field (no-op when nothing is committed).
                    if let Some(restored) = self.supervisor.retract() {
                        self.cursor = restored.len();
                        self.input = restored;
                    }
                } else if self.cursor > 0 {
                    let start = prev_boundary(&self.input, self.cursor);
                    self.input.replace_range(start..self.cursor, "");
                    self.cursor = start;
                    self.supervisor.tail_changed(&self.input);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.input.len() {
                    let end = next_boundary(&self.input, self.cursor);
                    self.input.replace_range(self.cursor..end, "");
                    self.supervisor.tail_changed(&self.input);
                }
            }
            KeyCode::Left => {
                if self.cursor > 0 {
                    self.cursor = prev_boundary(&self.input, self.cursor);
                }
            }
            KeyCode::Right => {
                if self.cursor < self.input.len() {
                    self.cursor = next_boundary(&self.input, self.cursor);
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.len(),
            _ => {}
        }
    }

    /// Delete the word before the cursor, shell style.
    fn delete_word(&mut self) {
        let head = &self.input[..self.cursor];
        let trimmed = head.trim_end();
        let cut = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        self.input.replace_range(cut..self.cursor, "");
        self.cursor = cut;
    }

    /// Render the prompt line and both preview panes.
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = TermLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        self.render_prompt(frame, chunks[0]);

        let direction = match self.layout {
            Layout::Columns => Direction::Horizontal,
            Layout::Rows => Direction::Vertical,
        };
        let panes = TermLayout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.stdin_pane.render(frame, panes[0], self.spinner_frame);
        self.stdout_pane.render(frame, panes[1], self.spinner_frame);

        // Publish the visible row capacity for the next runs: pane height
        // minus its top and bottom border.
        let rows = panes[0].height.saturating_sub(2) as usize;
        self.view_rows.store(rows, Ordering::Relaxed);
    }

    fn render_prompt(&self, frame: &mut Frame, area: Rect) {
        let label = self.supervisor.prompt_label(self.symbol);
        let line = Line::from(vec![
            Span::styled(
                label.clone(),
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(self.input.clone(), Style::default().fg(theme::TEXT_PRIMARY)),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let cursor_cols = label.chars().count() + self.input[..self.cursor].chars().count();
        let x = area.x + (cursor_cols as u16).min(area.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(x, area.y));
    }
}

fn prev_boundary(text: &str, index: usize) -> usize {
    let mut i = index;
    while i > 0 {
        i -= 1;
        if text.is_char_boundary(i) {
            break;
        }
    }
    i
}

fn next_boundary(text: &str, index: usize) -> usize {
    let mut i = index + 1;
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prev_boundary_ascii() {
        assert_eq!(prev_boundary("abc", 3), 2);
        assert_eq!(prev_boundary("abc", 1), 0);
        assert_eq!(prev_boundary("abc", 0), 0);
    }

    #[test]
    fn test_boundaries_multibyte() {
        let s = "a\u{00e9}b"; // 'é' is two bytes
        assert_eq!(next_boundary(s, 1), 3);
        assert_eq!(prev_boundary(s, 3), 1);
    }
}
