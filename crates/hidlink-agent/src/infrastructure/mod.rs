//! Infrastructure layer for the agent.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `hidlink_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`actuator`** – software `HidActuator` implementations (logging and
//!   recording mock).
//! - **`config`** – TOML configuration file and platform path resolution.
//! - **`transport`** – serial, TCP and HTTP front-ends.

pub mod actuator;
pub mod config;
pub mod transport;
