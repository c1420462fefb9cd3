//! hidlink agent library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the agent do?
//!
//! The agent sits between a controlling host and a keyboard/mouse actuator.
//! It accepts commands on up to three front-ends at once:
//!
//! 1. **Serial** – a line or binary-framed byte stream on a UART/CDC port.
//! 2. **TCP** – the same byte-stream protocols over a socket.
//! 3. **HTTP** – one command per GET request, parameters in the query string.
//!
//! Every front-end decodes into a [`hidlink_core::Command`] and submits it to
//! the single control loop, which executes commands one at a time against a
//! [`HidActuator`](application::dispatch::HidActuator).

/// Application layer: command dispatch and the control loop.
pub mod application;

/// Infrastructure layer: actuators, configuration, and transports.
pub mod infrastructure;
