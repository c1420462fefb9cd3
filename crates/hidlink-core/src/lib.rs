//! # hidlink-core
//!
//! Command protocol layer for hidlink, a remote keyboard/mouse injection agent.
//!
//! A host sends input commands over a serial line, a TCP stream or HTTP.  Every
//! transport resolves to the same problem: decode an untrusted, possibly
//! fragmented byte stream into a small fixed set of commands with clamped
//! parameters.  This crate does exactly that and nothing else; it has no I/O
//! and no dependency on the input device.
//!
//! - **`protocol`** – The binary frame decoder, the text line decoder, the
//!   query-parameter adapter, and the [`Command`] model they all produce.
//!
//! - **`keymap`** – USB HID usage codes (the canonical key representation) and
//!   the US-layout ASCII table used by adapters that accept characters.

pub mod keymap;
pub mod protocol;

pub use keymap::hid::HidKeyCode;
pub use protocol::command::{
    Command, CommandError, KeyCombo, KeyList, ModifierMask, MouseButton, MouseButtons,
};
pub use protocol::frame::{Frame, FrameDecoder, FramingError};
pub use protocol::line::LineDecoder;
pub use protocol::reply::Reply;
