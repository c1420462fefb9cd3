//! Application layer for the agent.
//!
//! - **`dispatch`** – turns a decoded [`Command`](hidlink_core::Command) into
//!   an ordered sequence of actuator calls, including the press/hold/release
//!   timing of key combos.  The actuator is injected as a trait object.
//!
//! - **`control_loop`** – owns the [`Dispatcher`](dispatch::Dispatcher) on a
//!   dedicated thread and serialises commands from every transport.

pub mod control_loop;
pub mod dispatch;
