use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Terminal input relevant to the composer.
#[derive(Debug)]
pub enum InputEvent {
    Key(KeyEvent),
    Resize,
}

/// Reads crossterm events on a dedicated thread and forwards the ones the
/// app cares about. Blocking `event::read` must stay off the async runtime.
pub struct InputReader {
    rx: mpsc::UnboundedReceiver<InputEvent>,
}

impl InputReader {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || loop {
            if !event::poll(POLL_INTERVAL).unwrap_or(false) {
                continue;
            }
            let forwarded = match event::read() {
                // Key repeats count as presses; releases do not.
                Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    Some(InputEvent::Key(key))
                }
                Ok(CrosstermEvent::Resize(_, _)) => Some(InputEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(event) = forwarded {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Next pending event, without blocking.
    pub fn try_recv(&mut self) -> Option<InputEvent> {
        self.rx.try_recv().ok()
    }
}
