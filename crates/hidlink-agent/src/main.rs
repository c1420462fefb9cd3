//! hidlink agent entry point.
//!
//! Loads the configuration, starts the control loop around the actuator and
//! runs every enabled transport until Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! hidlink-agent [OPTIONS]
//!
//! Options:
//!   --config <PATH>             Config file [default: platform config dir]
//!   --log-level <FILTER>        tracing filter when RUST_LOG is unset
//!   --tcp-bind <ADDR>           TCP listen address
//!   --tcp-protocol <PROTOCOL>   line | binary
//!   --no-tcp                    Disable the TCP transport
//!   --http-bind <ADDR>          HTTP listen address
//!   --no-http                   Disable the HTTP transport
//!   --serial <DEVICE>           Enable the serial transport on DEVICE
//!   --serial-protocol <PROTO>   line | binary
//!   --baud <BAUD>               Serial baud rate
//!   --print-config              Print the effective config and exit
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence over the environment, which takes precedence over
//! the config file.
//!
//! | Variable             | Equivalent flag     |
//! |----------------------|---------------------|
//! | `HIDLINK_CONFIG`     | `--config`          |
//! | `HIDLINK_LOG`        | `--log-level`       |
//! | `HIDLINK_TCP_BIND`   | `--tcp-bind`        |
//! | `HIDLINK_NO_TCP`     | `--no-tcp`          |
//! | `HIDLINK_HTTP_BIND`  | `--http-bind`       |
//! | `HIDLINK_NO_HTTP`    | `--no-http`         |
//! | `HIDLINK_SERIAL`     | `--serial`          |
//! | `HIDLINK_BAUD`       | `--baud`            |
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ control_loop::spawn()   -- dispatcher thread around LoggingActuator
//!  ├─ serve_tcp()             -- tokio task
//!  ├─ serve_http()            -- tokio task
//!  └─ spawn_serial()          -- OS thread
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context};
use clap::Parser;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hidlink_agent::application::control_loop::{self, DEFAULT_QUEUE_DEPTH};
use hidlink_agent::application::dispatch::{Dispatcher, HidActuator, ThreadSleeper};
use hidlink_agent::infrastructure::actuator::LoggingActuator;
use hidlink_agent::infrastructure::config::{load_config, render_config, AgentConfig};
use hidlink_agent::infrastructure::transport::http::serve_http;
use hidlink_agent::infrastructure::transport::serial::spawn_serial;
use hidlink_agent::infrastructure::transport::tcp::serve_tcp;
use hidlink_agent::infrastructure::transport::WireProtocol;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Keyboard/mouse command agent.
///
/// Accepts line, binary-framed and HTTP commands and replays them on the
/// attached HID actuator.
#[derive(Debug, Parser)]
#[command(name = "hidlink-agent", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "HIDLINK_CONFIG")]
    config: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[arg(long, env = "HIDLINK_LOG")]
    log_level: Option<String>,

    /// TCP listen address, e.g. `127.0.0.1:7070`.
    #[arg(long, env = "HIDLINK_TCP_BIND")]
    tcp_bind: Option<String>,

    /// Protocol spoken on TCP connections.
    #[arg(long, value_enum)]
    tcp_protocol: Option<WireProtocol>,

    /// Disable the TCP transport.
    #[arg(long, env = "HIDLINK_NO_TCP")]
    no_tcp: bool,

    /// HTTP listen address, e.g. `127.0.0.1:8080`.
    #[arg(long, env = "HIDLINK_HTTP_BIND")]
    http_bind: Option<String>,

    /// Disable the HTTP transport.
    #[arg(long, env = "HIDLINK_NO_HTTP")]
    no_http: bool,

    /// Enable the serial transport on this device.
    #[arg(long, env = "HIDLINK_SERIAL")]
    serial: Option<String>,

    /// Protocol spoken on the serial line.
    #[arg(long, value_enum)]
    serial_protocol: Option<WireProtocol>,

    /// Serial baud rate.
    #[arg(long, env = "HIDLINK_BAUD")]
    baud: Option<u32>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Layers the command-line overrides on top of the loaded file config.
    fn apply(&self, config: &mut AgentConfig) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }

        if let Some(bind) = &self.tcp_bind {
            config.tcp.bind_address = bind.clone();
        }
        if let Some(protocol) = self.tcp_protocol {
            config.tcp.protocol = protocol;
        }
        if self.no_tcp {
            config.tcp.enabled = false;
        }

        if let Some(bind) = &self.http_bind {
            config.http.bind_address = bind.clone();
        }
        if self.no_http {
            config.http.enabled = false;
        }

        if let Some(device) = &self.serial {
            config.serial.enabled = true;
            config.serial.device = device.clone();
        }
        if let Some(protocol) = self.serial_protocol {
            config.serial.protocol = protocol;
        }
        if let Some(baud) = self.baud {
            config.serial.baud = baud;
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{}", render_config(&config)?);
        return Ok(());
    }

    init_tracing(&config.log_level);

    if !(config.tcp.enabled || config.http.enabled || config.serial.enabled) {
        bail!("every transport is disabled; enable at least one of tcp, http or serial");
    }

    info!(
        tcp = config.tcp.enabled,
        http = config.http.enabled,
        serial = config.serial.enabled,
        "hidlink agent starting"
    );

    // ── Control loop ──────────────────────────────────────────────────────────
    let actuator: Arc<dyn HidActuator> = Arc::new(LoggingActuator::new());
    let dispatcher = Dispatcher::new(actuator, Box::new(ThreadSleeper), config.dispatch.settings());
    let (handle, control_thread) =
        control_loop::spawn(dispatcher, DEFAULT_QUEUE_DEPTH).context("failed to start control loop")?;

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Transports ────────────────────────────────────────────────────────────
    let mut transports: JoinSet<anyhow::Result<()>> = JoinSet::new();

    if config.serial.enabled {
        let thread = spawn_serial(&config.serial, handle.clone(), Arc::clone(&running))
            .context("failed to start serial transport")?;
        transports.spawn(async move {
            tokio::task::spawn_blocking(move || thread.join())
                .await?
                .map_err(|_| anyhow::anyhow!("serial thread panicked"))
        });
    }

    if config.tcp.enabled {
        let bind = config.tcp.bind_address.clone();
        let protocol = config.tcp.protocol;
        let (handle, running) = (handle.clone(), Arc::clone(&running));
        transports.spawn(async move { serve_tcp(&bind, protocol, handle, running).await });
    }

    if config.http.enabled {
        let bind = config.http.bind_address.clone();
        let (handle, running) = (handle.clone(), Arc::clone(&running));
        transports.spawn(async move { serve_http(&bind, handle, running).await });
    }

    // Transports hold the remaining handles; the control loop exits after them.
    drop(handle);

    let mut outcome = Ok(());
    while let Some(joined) = transports.join_next().await {
        let result = joined.context("transport task panicked").and_then(|r| r);
        if let Err(e) = result {
            error!("{e:#}");
            running.store(false, Ordering::Relaxed);
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }
    }

    tokio::task::spawn_blocking(move || control_thread.join())
        .await?
        .map_err(|_| anyhow::anyhow!("control loop panicked"))?;

    info!("hidlink agent stopped");
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_arguments_leaves_config_untouched() {
        // Arrange
        let cli = Cli::parse_from(["hidlink-agent"]);
        let mut config = AgentConfig::default();

        // Act
        cli.apply(&mut config);

        // Assert
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_cli_serial_device_enables_serial() {
        let cli = Cli::parse_from(["hidlink-agent", "--serial", "/dev/ttyUSB0", "--baud", "9600"]);
        let mut config = AgentConfig::default();

        cli.apply(&mut config);

        assert!(config.serial.enabled);
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud, 9600);
    }

    #[test]
    fn test_cli_disable_flags_turn_off_transports() {
        let cli = Cli::parse_from(["hidlink-agent", "--no-tcp", "--no-http"]);
        let mut config = AgentConfig::default();

        cli.apply(&mut config);

        assert!(!config.tcp.enabled);
        assert!(!config.http.enabled);
    }

    #[test]
    fn test_cli_bind_and_protocol_overrides() {
        // Arrange
        let cli = Cli::parse_from([
            "hidlink-agent",
            "--tcp-bind",
            "127.0.0.1:9000",
            "--tcp-protocol",
            "binary",
            "--http-bind",
            "127.0.0.1:9001",
            "--log-level",
            "debug",
        ]);
        let mut config = AgentConfig::default();

        // Act
        cli.apply(&mut config);

        // Assert
        assert_eq!(config.tcp.bind_address, "127.0.0.1:9000");
        assert_eq!(config.tcp.protocol, WireProtocol::Binary);
        assert_eq!(config.http.bind_address, "127.0.0.1:9001");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_cli_rejects_unknown_protocol() {
        let result = Cli::try_parse_from(["hidlink-agent", "--tcp-protocol", "morse"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_config_path_is_captured() {
        let cli = Cli::parse_from(["hidlink-agent", "--config", "/etc/hidlink.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/hidlink.toml")));
    }
}
