//! TCP byte-stream transport.
//!
//! Serves one client at a time: the accept loop runs the session to
//! completion before accepting the next connection.  This mirrors the
//! single-link nature of the serial and BLE front-ends and means a second
//! client simply waits in the listen backlog.
//!
//! Shutdown is triggered by a shared `AtomicBool` (see `main.rs`).  The accept
//! loop and an idle session both check it every 200 ms, so a connected client
//! does not hold up shutdown.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::stream::{run_session, WireProtocol};
use crate::application::control_loop::CommandHandle;

const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Binds `bind` and serves clients until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn serve_tcp(
    bind: &str,
    protocol: WireProtocol,
    handle: CommandHandle,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind TCP listener on {bind}"))?;
    info!(addr = %listener.local_addr()?, %protocol, "TCP transport listening");
    serve_listener(listener, protocol, handle, running).await;
    Ok(())
}

/// Accept loop over an already-bound listener.
pub async fn serve_listener(
    listener: TcpListener,
    protocol: WireProtocol,
    handle: CommandHandle,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                info!(%peer, "TCP client connected");
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(%peer, "could not disable Nagle: {e}");
                }
                log_session_end(peer, run_session(stream, protocol, &handle, &running).await);
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            // No connection within the poll interval; re-check the flag.
            Err(_) => {}
        }
    }
    info!("TCP transport stopped");
}

fn log_session_end(peer: SocketAddr, result: std::io::Result<()>) {
    match result {
        Ok(()) => info!(%peer, "TCP client disconnected"),
        Err(e) => warn!(%peer, "TCP session ended with error: {e}"),
    }
}
