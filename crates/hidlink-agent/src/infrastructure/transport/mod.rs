//! Transports: the byte and request front-ends feeding the control loop.
//!
//! - **`stream`** – protocol selection plus the per-connection session loop
//!   shared by every byte-stream transport.
//! - **`tcp`** – TCP listener serving one client at a time.
//! - **`serial`** – blocking serial-port reader thread.
//! - **`http`** – query-parameter routes served by `axum`.

pub mod http;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use stream::{run_session, StreamDecoder, WireProtocol};
