use crate::cancel::CancelToken;
use crate::event::{Pane, PreviewEvent};
use crate::exec::{ShellRunner, StageRunner, StageSpec};
use crate::pipeline::PipelineState;
use crate::store::{StageGate, StageResultStore};
use crate::truncate::LineTruncator;
use plumb_config::Config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Fallback preview height before the front end has published one.
const DEFAULT_VIEW_ROWS: usize = 24;

/// Drives the live re-evaluation of the pipeline being composed.
///
/// Owns the segmentation state, one cancellation token per preview pane,
/// and the adopted-result store. Every trigger cancels the stale runs for
/// its scope, allocates fresh tokens, and spawns detached tasks; a
/// completing run re-checks its own token before every adoption step, so
/// the adopted result always corresponds to the most recent edit —
/// last-edit-wins, never last-to-finish-wins.
///
/// All progress is communicated via `PreviewEvent`s through the event
/// sender. The supervisor never touches the terminal — consumers decide
/// how to display events.
pub struct ExecutionSupervisor {
    state: PipelineState,
    config: Arc<Config>,
    runner: Arc<dyn StageRunner>,
    store: Arc<StageResultStore>,
    gate: Arc<StageGate>,
    event_tx: mpsc::UnboundedSender<PreviewEvent>,
    view_rows: Arc<AtomicUsize>,
    external_input: Arc<Vec<u8>>,
    stdin_token: CancelToken,
    stdout_token: CancelToken,
    stdin_generation: u64,
}

impl ExecutionSupervisor {
    /// Create a supervisor seeded from the configured initial text.
    ///
    /// `event_tx` is required — all progress is communicated via events.
    pub fn new(
        config: Arc<Config>,
        external_input: Vec<u8>,
        event_tx: mpsc::UnboundedSender<PreviewEvent>,
    ) -> Self {
        let runner = Arc::new(ShellRunner::new(config.shell.clone()));
        let state = PipelineState::from_text(&config.initial_text);
        Self {
            state,
            config,
            runner,
            store: Arc::new(StageResultStore::new()),
            gate: Arc::new(StageGate::new()),
            event_tx,
            view_rows: Arc::new(AtomicUsize::new(0)),
            external_input: Arc::new(external_input),
            stdin_token: CancelToken::new(),
            stdout_token: CancelToken::new(),
            stdin_generation: 0,
        }
    }

    /// Override the stage runner (for testing).
    pub fn with_runner(mut self, runner: Arc<dyn StageRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Shared handle the front end updates with the current visible row
    /// capacity. New runs sample it when they start.
    pub fn view_rows(&self) -> Arc<AtomicUsize> {
        self.view_rows.clone()
    }

    /// The adopted-result store for the stdin-preview stage.
    pub fn store(&self) -> Arc<StageResultStore> {
        self.store.clone()
    }

    pub fn tail(&self) -> &str {
        self.state.tail()
    }

    pub fn has_committed(&self) -> bool {
        self.state.has_committed()
    }

    /// The assembled command line as typed.
    pub fn full_text(&self) -> String {
        self.state.full_text()
    }

    pub fn prompt_label(&self, symbol: &str) -> String {
        self.state.prompt_label(symbol)
    }

    /// Kick off the initial previews for the seeded state.
    pub fn start(&mut self) {
        self.refresh_stdin();
        self.refresh_stdout();
    }

    /// The tail text changed (keystroke): re-run the stdout preview only,
    /// against the existing adopted stdin result.
    pub fn tail_changed(&mut self, tail: &str) {
        self.state.set_tail(tail);
        self.refresh_stdout();
    }

    /// A `|` was typed: fix the tail as a stage, then re-run both previews.
    pub fn commit(&mut self) {
        self.state.commit();
        self.refresh_stdin();
        self.refresh_stdout();
    }

    /// Backspace on an empty tail: move the last committed stage back into
    /// the tail and re-run both previews for the shortened pipeline.
    /// Returns the restored tail, or `None` when there was nothing to
    /// retract.
    pub fn retract(&mut self) -> Option<String> {
        if !self.state.retract() {
            return None;
        }
        self.refresh_stdin();
        self.refresh_stdout();
        Some(self.state.tail().to_string())
    }

    /// Cancel every in-flight run. Called on accept and abort; kill
    /// propagates to live subprocesses so none outlives the session.
    pub fn shutdown(&mut self) {
        self.stdin_token.cancel();
        self.stdout_token.cancel();
    }

    fn current_limit(&self) -> usize {
        match self.view_rows.load(Ordering::Relaxed) {
            0 => DEFAULT_VIEW_ROWS,
            rows => rows,
        }
    }

    /// Re-run the stdin-preview stage: the committed prefix against the
    /// external input. With no committed stages, the external input itself
    /// is adopted as the preview.
    fn refresh_stdin(&mut self) {
        self.stdin_token.cancel();
        self.stdin_token = CancelToken::new();
        self.stdin_generation += 1;

        let generation = self.stdin_generation;
        let token = self.stdin_token.clone();
        let gate = self.gate.clone();
        let store = self.store.clone();
        let tx = self.event_tx.clone();
        let limit = self.current_limit();
        let input = self.external_input.clone();

        if !self.state.has_committed() {
            tokio::spawn(async move {
                if !token.is_cancelled() {
                    let _ = tx.send(PreviewEvent::RunStarted { pane: Pane::Stdin });
                    emit_truncated(&tx, Pane::Stdin, &input, limit, &token);
                    store.set(input.as_ref().clone());
                    let _ = tx.send(PreviewEvent::RunFinished { pane: Pane::Stdin });
                }
                gate.settle(generation);
            });
            return;
        }

        let command = self.state.committed_command().to_string();

        if let Some(denied) = self.config.denies(&command) {
            // A commit must not execute a command whose live preview was
            // suppressed one keystroke earlier; adopt empty bytes instead.
            debug!(command = %command, token = %denied, "stdin preview suppressed");
            let denied = denied.to_string();
            tokio::spawn(async move {
                if !token.is_cancelled() {
                    store.set(Vec::new());
                    let _ = tx.send(PreviewEvent::Suppressed {
                        pane: Pane::Stdin,
                        token: denied,
                    });
                }
                gate.settle(generation);
            });
            return;
        }

        let runner = self.runner.clone();
        tokio::spawn(async move {
            if token.is_cancelled() {
                gate.settle(generation);
                return;
            }
            let _ = tx.send(PreviewEvent::RunStarted { pane: Pane::Stdin });

            let spec = StageSpec {
                command,
                merge_stderr: false,
                capture: true,
            };
            let result = run_and_forward(
                runner.as_ref(),
                &spec,
                &input,
                limit,
                Pane::Stdin,
                &tx,
                &token,
            )
            .await;

            if let Ok(bytes) = result {
                if !token.is_cancelled() {
                    debug!(adopted_len = bytes.len(), "stdin preview adopted");
                    store.set(bytes);
                    let _ = tx.send(PreviewEvent::RunFinished { pane: Pane::Stdin });
                }
            }
            gate.settle(generation);
        });
    }

    /// Re-run the stdout-preview stage: the full current text against the
    /// adopted stdin result, waiting first for an in-flight producer.
    fn refresh_stdout(&mut self) {
        self.stdout_token.cancel();
        self.stdout_token = CancelToken::new();

        let token = self.stdout_token.clone();
        let tx = self.event_tx.clone();
        let command = self.state.preview_command();

        if let Some(denied) = self.config.denies(&command) {
            debug!(command = %command, token = %denied, "stdout preview suppressed");
            let _ = tx.send(PreviewEvent::Suppressed {
                pane: Pane::Stdout,
                token: denied.to_string(),
            });
            return;
        }

        let producer_generation = self.stdin_generation;
        let gate = self.gate.clone();
        let store = self.store.clone();
        let runner = self.runner.clone();
        let limit = self.current_limit();

        tokio::spawn(async move {
            if !gate.wait(producer_generation, &token).await {
                return;
            }
            let input = store.get();
            if token.is_cancelled() {
                return;
            }
            let _ = tx.send(PreviewEvent::RunStarted { pane: Pane::Stdout });

            let spec = StageSpec {
                command,
                merge_stderr: true,
                capture: false,
            };
            let result = run_and_forward(
                runner.as_ref(),
                &spec,
                &input,
                limit,
                Pane::Stdout,
                &tx,
                &token,
            )
            .await;

            if result.is_ok() && !token.is_cancelled() {
                let _ = tx.send(PreviewEvent::RunFinished { pane: Pane::Stdout });
            }
        });
    }
}

impl Drop for ExecutionSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run one stage, forwarding its output through a fresh line truncator as
/// chunk events. Returns the stage's captured bytes.
async fn run_and_forward(
    runner: &dyn StageRunner,
    spec: &StageSpec,
    input: &[u8],
    limit: usize,
    pane: Pane,
    tx: &mpsc::UnboundedSender<PreviewEvent>,
    token: &CancelToken,
) -> crate::error::CoreResult<Vec<u8>> {
    let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let forward = async {
        let mut truncator = LineTruncator::new(limit);
        while let Some(chunk) = chunk_rx.recv().await {
            let mut step = truncator.write(&chunk);
            loop {
                if !step.out.is_empty() && !token.is_cancelled() {
                    let _ = tx.send(PreviewEvent::Chunk {
                        pane,
                        bytes: step.out,
                    });
                }
                if !step.more {
                    break;
                }
                step = truncator.write(&[]);
            }
        }
    };

    let (result, ()) = tokio::join!(runner.run(spec, input, chunk_tx, token), forward);
    result
}

/// Push already-available bytes (the external input) through the truncation
/// filter as chunk events.
fn emit_truncated(
    tx: &mpsc::UnboundedSender<PreviewEvent>,
    pane: Pane,
    bytes: &[u8],
    limit: usize,
    token: &CancelToken,
) {
    let mut truncator = LineTruncator::new(limit);
    let mut step = truncator.write(bytes);
    loop {
        if !step.out.is_empty() && !token.is_cancelled() {
            let _ = tx.send(PreviewEvent::Chunk {
                pane,
                bytes: step.out,
            });
        }
        if !step.more {
            break;
        }
        step = truncator.write(&[]);
    }
}
