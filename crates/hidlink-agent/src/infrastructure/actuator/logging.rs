//! Dry-run actuator: logs every call instead of touching a device.
//!
//! Useful for exercising a host integration end to end on a machine with no
//! HID gadget attached.  Run the agent with `RUST_LOG=hidlink::actuator=info`
//! to see the stream of injected input.

use std::sync::atomic::{AtomicBool, Ordering};

use hidlink_core::MouseButton;
use tracing::info;

use crate::application::dispatch::{ActuatorError, HidActuator};

const TARGET: &str = "hidlink::actuator";

/// Actuator that reports each call as a `tracing` event.
#[derive(Debug)]
pub struct LoggingActuator {
    connected: AtomicBool,
}

impl Default for LoggingActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
        }
    }

    /// Simulates the host link going up or down.
    pub fn set_connected(&self, connected: bool) {
        info!(target: TARGET, connected, "link state changed");
        self.connected.store(connected, Ordering::Relaxed);
    }
}

impl HidActuator for LoggingActuator {
    fn press(&self, code: u8) -> Result<(), ActuatorError> {
        info!(target: TARGET, code = format_args!("0x{code:02X}"), "key down");
        Ok(())
    }

    fn release(&self, code: u8) -> Result<(), ActuatorError> {
        info!(target: TARGET, code = format_args!("0x{code:02X}"), "key up");
        Ok(())
    }

    fn release_all(&self) -> Result<(), ActuatorError> {
        info!(target: TARGET, "release all keys");
        Ok(())
    }

    fn move_and_scroll(&self, dx: i8, dy: i8, wheel: i8) -> Result<(), ActuatorError> {
        info!(target: TARGET, dx, dy, wheel, "mouse report");
        Ok(())
    }

    fn click(&self, button: MouseButton) -> Result<(), ActuatorError> {
        info!(target: TARGET, %button, "click");
        Ok(())
    }

    fn press_button(&self, button: MouseButton) -> Result<(), ActuatorError> {
        info!(target: TARGET, %button, "button down");
        Ok(())
    }

    fn release_button(&self, button: MouseButton) -> Result<(), ActuatorError> {
        info!(target: TARGET, %button, "button up");
        Ok(())
    }

    fn type_char(&self, ch: char) -> Result<(), ActuatorError> {
        info!(target: TARGET, ch = ?ch, "type");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
