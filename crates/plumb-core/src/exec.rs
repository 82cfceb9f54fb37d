use crate::cancel::CancelToken;
use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One stage invocation request.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Stage text, passed verbatim to `<shell> -c`.
    pub command: String,

    /// Also drain stderr into the chunk stream. Set for the outermost
    /// stdout-preview stage so shell errors show up live.
    pub merge_stderr: bool,

    /// Capture the complete stdout for downstream consumption. Set for the
    /// stdin-preview stage, whose bytes feed the next stage.
    pub capture: bool,
}

/// Seam between the supervisor and subprocess execution.
///
/// The production implementation spawns real shells; tests substitute a
/// scripted runner to drive the supervisor deterministically.
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Run one stage to completion.
    ///
    /// `input` becomes the stage's entire standard input. Raw output
    /// chunks are sent through `chunk_tx` as they arrive; the channel is
    /// dropped when the stage finishes. Returns the captured stdout when
    /// `spec.capture` is set, an empty buffer otherwise.
    ///
    /// A stage that fails to spawn or exits non-zero is not an error —
    /// whatever bytes it produced are the result. Only cancellation is
    /// reported, as `CoreError::Cancelled`.
    async fn run(
        &self,
        spec: &StageSpec,
        input: &[u8],
        chunk_tx: mpsc::UnboundedSender<Vec<u8>>,
        cancel: &CancelToken,
    ) -> CoreResult<Vec<u8>>;
}

/// Production runner: every stage executes as `<shell> -c <command>`.
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl StageRunner for ShellRunner {
    async fn run(
        &self,
        spec: &StageSpec,
        input: &[u8],
        chunk_tx: mpsc::UnboundedSender<Vec<u8>>,
        cancel: &CancelToken,
    ) -> CoreResult<Vec<u8>> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&spec.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if spec.merge_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        debug!(command = %spec.command, "spawning stage");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                // Spawn failure renders as empty output, not an error.
                warn!(command = %spec.command, error = %e, "stage failed to spawn");
                return Ok(Vec::new());
            }
        };

        // Feed stdin from its own task: a child that fills its stdout pipe
        // before draining stdin would otherwise deadlock against us.
        if let Some(mut stdin) = child.stdin.take() {
            let input = input.to_vec();
            tokio::spawn(async move {
                let _ = stdin.write_all(&input).await;
                let _ = stdin.shutdown().await;
            });
        }

        // Merge stdout (and stderr when requested) into one ordered stream
        // of raw chunks. The flag marks stdout chunks for capture.
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<(bool, Vec<u8>)>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drain(stdout, raw_tx.clone(), true));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain(stderr, raw_tx.clone(), false));
        }
        drop(raw_tx);

        let mut captured = Vec::new();
        loop {
            tokio::select! {
                chunk = raw_rx.recv() => match chunk {
                    Some((from_stdout, bytes)) => {
                        if spec.capture && from_stdout {
                            captured.extend_from_slice(&bytes);
                        }
                        let _ = chunk_tx.send(bytes);
                    }
                    None => break,
                },
                () = cancel.cancelled() => {
                    debug!(command = %spec.command, "cancelling stage, killing child");
                    let _ = child.kill().await;
                    return Err(CoreError::Cancelled);
                }
            }
        }

        match child.wait().await {
            Ok(status) if !status.success() => {
                // Non-zero exit is captured silently; the output stands.
                debug!(command = %spec.command, status = %status, "stage exited non-zero");
            }
            Ok(_) => {}
            Err(e) => warn!(command = %spec.command, error = %e, "failed to wait for stage"),
        }

        Ok(captured)
    }
}

/// Read a stream to EOF, forwarding chunks tagged with their origin.
async fn drain<R>(mut reader: R, tx: mpsc::UnboundedSender<(bool, Vec<u8>)>, from_stdout: bool)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send((from_stdout, buf[..n].to_vec())).is_err() {
                    break;
                }
            }
        }
    }
}
