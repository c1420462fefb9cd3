//! Serial-line transport.
//!
//! A dedicated OS thread reads the port with a short timeout, feeds a
//! [`StreamDecoder`] and submits commands with
//! [`CommandHandle::submit_blocking`].  In line mode the reply is written back
//! on the same port, one `OK` / `ERR ...` per line.
//!
//! The port is opened 8N1 with no flow control, which is what USB CDC gadgets
//! and most microcontroller UARTs expect.

use std::io::{self, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use hidlink_core::Reply;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use thiserror::Error;
use tracing::{info, warn};

use super::stream::{StreamDecoder, WireProtocol, READ_CHUNK};
use crate::application::control_loop::CommandHandle;
use crate::infrastructure::config::SerialConfig;

/// Read timeout; bounds how long shutdown takes to notice the flag.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Error type for the serial transport.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("no serial device configured")]
    NoDevice,

    #[error("failed to open serial port {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to start serial thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Opens the configured port and starts the reader thread.
///
/// # Errors
///
/// Returns [`SerialError`] if no device is configured, the port cannot be
/// opened, or the thread cannot be created.
pub fn spawn_serial(
    config: &SerialConfig,
    handle: CommandHandle,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>, SerialError> {
    if config.device.is_empty() {
        return Err(SerialError::NoDevice);
    }

    let port = serialport::new(&config.device, config.baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|source| SerialError::Open {
            device: config.device.clone(),
            source,
        })?;

    info!(device = %config.device, baud = config.baud, protocol = %config.protocol, "serial transport open");

    let protocol = config.protocol;
    let device = config.device.clone();
    std::thread::Builder::new()
        .name("hidlink-serial".to_string())
        .spawn(move || {
            match serve_port(port, protocol, &handle, &running) {
                Ok(()) => info!(%device, "serial transport stopped"),
                Err(e) => warn!(%device, "serial transport failed: {e}"),
            }
        })
        .map_err(SerialError::Spawn)
}

/// Runs the read/dispatch/reply loop over any blocking byte port.
///
/// Returns when `running` is cleared or the port reports end of stream.
/// Read timeouts are expected and simply re-check the flag.
///
/// # Errors
///
/// Returns the first non-timeout I/O error.
pub fn serve_port<P>(
    mut port: P,
    protocol: WireProtocol,
    handle: &CommandHandle,
    running: &AtomicBool,
) -> io::Result<()>
where
    P: Read + Write,
{
    let mut decoder = StreamDecoder::new(protocol);
    let mut buf = [0u8; READ_CHUNK];

    while running.load(Ordering::Relaxed) {
        let n = match port.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        for &byte in &buf[..n] {
            let Some(outcome) = decoder.push(byte) else {
                continue;
            };
            let reply = match outcome {
                Ok(command) => match handle.submit_blocking(command) {
                    Ok(()) => Reply::Ok,
                    Err(e) => Reply::from(e),
                },
                Err(e) => Reply::from(e),
            };
            match protocol {
                WireProtocol::Line => {
                    port.write_all(format!("{reply}\n").as_bytes())?;
                    port.flush()?;
                }
                WireProtocol::Binary => {
                    if let Reply::Err(reason) = &reply {
                        warn!(%reason, "binary command rejected");
                    }
                }
            }
        }
    }
    Ok(())
}
