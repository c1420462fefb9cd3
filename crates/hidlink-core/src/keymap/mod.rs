//! Key code tables.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Adapters that accept characters translate them here before building a command.

pub mod ascii;
pub mod hid;

pub use ascii::{char_to_hid, AsciiKey};
pub use hid::HidKeyCode;
