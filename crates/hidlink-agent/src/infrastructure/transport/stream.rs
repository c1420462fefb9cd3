//! Byte-stream sessions shared by the TCP and serial transports.
//!
//! A session owns one [`StreamDecoder`] for its whole lifetime, so commands
//! split across reads are reassembled.  In line mode every completed line
//! gets exactly one `OK` / `ERR ...` reply; binary mode is fire-and-forget and
//! writes nothing back.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::ValueEnum;
use hidlink_core::protocol::binary::decode_command;
use hidlink_core::protocol::line::parse_line;
use hidlink_core::{Command, CommandError, FrameDecoder, LineDecoder, Reply};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::application::control_loop::CommandHandle;

/// Read buffer size for stream transports.
pub const READ_CHUNK: usize = 512;

/// How often an idle session re-checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Which decoder a byte-stream transport runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WireProtocol {
    /// Newline-terminated text commands with replies.
    Line,
    /// `0xAA`-framed binary commands, no replies.
    Binary,
}

impl fmt::Display for WireProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireProtocol::Line => "line",
            WireProtocol::Binary => "binary",
        })
    }
}

/// Per-connection decoder for either wire protocol.
pub struct StreamDecoder {
    protocol: WireProtocol,
    frames: FrameDecoder,
    lines: LineDecoder,
}

impl StreamDecoder {
    pub fn new(protocol: WireProtocol) -> Self {
        Self {
            protocol,
            frames: FrameDecoder::new(),
            lines: LineDecoder::new(),
        }
    }

    /// Consumes one byte and returns a decode outcome when a command ends.
    ///
    /// Framing errors (bad checksum, zero length) are logged and swallowed;
    /// they never produce an outcome.
    pub fn push(&mut self, byte: u8) -> Option<Result<Command, CommandError>> {
        match self.protocol {
            WireProtocol::Line => self
                .lines
                .push(byte)
                .map(|line| parse_line(&line)),
            WireProtocol::Binary => match self.frames.feed(byte)? {
                Ok(frame) => Some(decode_command(&frame)),
                Err(e) => {
                    debug!(error = %e, "frame dropped");
                    None
                }
            },
        }
    }
}

/// Submits one decoded outcome and returns the reply the host should see.
pub async fn execute(outcome: Result<Command, CommandError>, handle: &CommandHandle) -> Reply {
    match outcome {
        Ok(command) => match handle.submit(command).await {
            Ok(()) => Reply::Ok,
            Err(e) => Reply::from(e),
        },
        Err(e) => Reply::from(e),
    }
}

/// Runs one session until the peer closes the stream or `running` is cleared.
///
/// Line replies are written as soon as their command finishes, so a long
/// combo hold does not delay the replies to commands before it.
///
/// # Errors
///
/// Returns the first I/O error from the stream.
pub async fn run_session<S>(
    mut stream: S,
    protocol: WireProtocol,
    handle: &CommandHandle,
    running: &AtomicBool,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut decoder = StreamDecoder::new(protocol);
    let mut buf = [0u8; READ_CHUNK];

    while running.load(Ordering::Relaxed) {
        let n = match timeout(SHUTDOWN_POLL, stream.read(&mut buf)).await {
            Ok(read) => read?,
            // Idle; re-check the flag.
            Err(_) => continue,
        };
        if n == 0 {
            return Ok(());
        }

        for &byte in &buf[..n] {
            let Some(outcome) = decoder.push(byte) else {
                continue;
            };
            let reply = execute(outcome, handle).await;
            match protocol {
                WireProtocol::Line => {
                    stream.write_all(format!("{reply}\n").as_bytes()).await?;
                    stream.flush().await?;
                }
                WireProtocol::Binary => {
                    if let Reply::Err(reason) = &reply {
                        warn!(%reason, "binary command rejected");
                    }
                }
            }
        }
    }
    debug!("session closed for shutdown");
    Ok(())
}
