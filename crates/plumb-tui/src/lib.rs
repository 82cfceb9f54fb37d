mod app;
mod input;
mod panes;
mod theme;

pub use app::AcceptOutcome;

use anyhow::Result;
use plumb_config::Config;
use std::sync::Arc;

/// Launch the full-screen composer.
///
/// Sets up the terminal (alternate screen, raw mode), runs the app event
/// loop, and restores the terminal on exit (including panics). Returns how
/// the session ended; the caller decides what to do with an accepted
/// command line.
pub async fn run_tui(config: Arc<Config>, stdin_bytes: Vec<u8>) -> Result<AcceptOutcome> {
    // Install a panic hook that restores the terminal before printing
    // the panic message — prevents garbled output on crash.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = ratatui::init();
    let mut app = app::App::new(config, stdin_bytes);

    let result = app.run(&mut terminal).await;

    ratatui::restore();

    result
}
