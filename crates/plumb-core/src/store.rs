//! Shared state between stage runs.
//!
//! Lock scope is deliberately narrow: the byte buffer's mutex is only ever
//! held for a copy in or out, never across an await point or subprocess
//! I/O. Waiting for a producing run is done through the watch-based
//! [`StageGate`], not by holding a lock or busy-polling.

use crate::cancel::CancelToken;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Holds the last adopted output of the stdin-preview stage.
///
/// Writer is whichever run wins adoption; readers are the stdout-preview
/// stage and the render path. Each adoption fully replaces prior content.
#[derive(Debug, Default)]
pub struct StageResultStore {
    data: Mutex<Vec<u8>>,
}

impl StageResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current adopted bytes.
    pub fn get(&self) -> Vec<u8> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the adopted bytes atomically.
    pub fn set(&self, bytes: Vec<u8>) {
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = bytes;
    }
}

/// Generation barrier between the stdin-preview producer and its readers.
///
/// The supervisor assigns each stdin-preview run a generation; the run
/// settles it in every exit path (adopted, suppressed, cancelled). A
/// downstream run waits for its producer's generation before reading the
/// store, aborting the wait when its own token is cancelled.
#[derive(Debug)]
pub struct StageGate {
    tx: watch::Sender<u64>,
}

impl Default for StageGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StageGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Mark `generation` (and every earlier one) settled.
    pub fn settle(&self, generation: u64) {
        self.tx.send_modify(|current| {
            if generation > *current {
                *current = generation;
            }
        });
    }

    /// Wait until `generation` has settled. Returns `false` when `token`
    /// was cancelled first.
    pub async fn wait(&self, generation: u64, token: &CancelToken) -> bool {
        let mut rx = self.tx.subscribe();
        tokio::select! {
            result = rx.wait_for(|settled| *settled >= generation) => result.is_ok(),
            () = token.cancelled() => false,
        }
    }
}
