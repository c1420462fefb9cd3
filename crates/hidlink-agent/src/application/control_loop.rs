//! The control loop: the single thread that owns the [`Dispatcher`].
//!
//! Every transport submits commands through a cloneable [`CommandHandle`].
//! Jobs run strictly one at a time in arrival order, so a combo with a long
//! hold delays every transport until it finishes.  That serialisation is what
//! keeps actuator state (held keys and buttons) consistent across sessions.
//!
//! ```text
//! tcp session ─┐
//! http request ┼─ CommandHandle ─ mpsc ─▶ control thread ─▶ Dispatcher ─▶ HidActuator
//! serial line ─┘                           (reply via oneshot)
//! ```
//!
//! The loop exits once every [`CommandHandle`] has been dropped.

use std::io;
use std::thread::JoinHandle;

use hidlink_core::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::dispatch::{DispatchError, Dispatcher};

/// Queue depth used when the caller has no preference.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

struct Job {
    command: Command,
    reply: oneshot::Sender<Result<(), DispatchError>>,
}

/// Submits commands to the control loop.
#[derive(Clone)]
pub struct CommandHandle {
    tx: mpsc::Sender<Job>,
}

impl CommandHandle {
    /// Queues `command` and waits for its outcome.
    ///
    /// # Errors
    ///
    /// Returns the dispatch error, or [`DispatchError::Stopped`] if the control
    /// loop is gone.
    pub async fn submit(&self, command: Command) -> Result<(), DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Job { command, reply })
            .await
            .map_err(|_| DispatchError::Stopped)?;
        rx.await.map_err(|_| DispatchError::Stopped)?
    }

    /// Blocking variant of [`submit`](Self::submit) for plain threads.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub fn submit_blocking(&self, command: Command) -> Result<(), DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(Job { command, reply })
            .map_err(|_| DispatchError::Stopped)?;
        rx.blocking_recv().map_err(|_| DispatchError::Stopped)?
    }
}

/// Starts the control thread.
///
/// # Errors
///
/// Returns an I/O error if the OS refuses to create the thread.
pub fn spawn(dispatcher: Dispatcher, queue_depth: usize) -> io::Result<(CommandHandle, JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel(queue_depth.max(1));
    let thread = std::thread::Builder::new()
        .name("hidlink-dispatch".to_string())
        .spawn(move || run(dispatcher, rx))?;
    Ok((CommandHandle { tx }, thread))
}

fn run(mut dispatcher: Dispatcher, mut rx: mpsc::Receiver<Job>) {
    info!("control loop started");
    while let Some(Job { command, reply }) = rx.blocking_recv() {
        let outcome = dispatcher.dispatch(&command);
        match &outcome {
            Ok(()) => debug!(command = command.name(), "dispatched"),
            Err(e) => debug!(command = command.name(), error = %e, "dispatch failed"),
        }
        // The submitter may have given up (e.g. HTTP client disconnected).
        let _ = reply.send(outcome);
    }
    info!("control loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
