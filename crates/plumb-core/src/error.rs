#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The run was superseded or the session is shutting down. Expected
    /// control flow, never surfaced to the user as a failure.
    #[error("stage run was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for plumb-core operations.
pub type CoreResult<T> = Result<T, CoreError>;
