/// Which preview pane an event addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Output of the committed prefix (or the external input when nothing
    /// is committed yet).
    Stdin,
    /// Output of the full current text.
    Stdout,
}

/// Structured events emitted by the supervisor while previews run.
///
/// This is the render-callback boundary: the supervisor never touches the
/// terminal. Consumers derive the busy indicator from `RunStarted` /
/// `RunFinished` on the stdin pane; `Chunk` bytes have already passed the
/// line-bounded truncation filter.
#[derive(Debug, Clone)]
pub enum PreviewEvent {
    /// A new run for this pane began; previous pane content is stale.
    RunStarted { pane: Pane },

    /// Truncated output bytes, in arrival order.
    Chunk { pane: Pane, bytes: Vec<u8> },

    /// The run completed and its result was adopted.
    RunFinished { pane: Pane },

    /// The deny-list matched this pane's command; no subprocess ran.
    Suppressed { pane: Pane, token: String },
}
