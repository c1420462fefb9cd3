//! [`HidActuator`](crate::application::dispatch::HidActuator) implementations.
//!
//! The physical USB/BLE HID device is outside this crate.  Two software
//! actuators are provided:
//!
//! - **`logging`** – dry-run actuator that emits one `tracing` event per call.
//!   This is what the agent binary drives.
//! - **`mock`** – records every call for assertions in tests.

pub mod logging;
pub mod mock;

pub use logging::LoggingActuator;
pub use mock::{ActuatorCall, MockActuator};
