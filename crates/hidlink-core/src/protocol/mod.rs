//! Command protocol layer.
//!
//! Three front-ends share one command model:
//!
//! - [`frame`] + [`binary`]: length-prefixed, checksummed binary frames.
//! - [`line`]: newline-terminated text commands with `OK` / `ERR` replies.
//! - [`query`]: HTTP-style routes with named parameters.
//!
//! Each decodes into a [`Command`]; [`Reply`] is the text acknowledgement.

pub mod binary;
pub mod command;
pub mod frame;
pub mod line;
pub mod query;
pub mod reply;

pub use binary::{decode_command, encode_command};
pub use command::{
    Command, CommandError, KeyCombo, KeyList, ModifierMask, MouseButton, MouseButtons, MAX_KEYS,
};
pub use frame::{Frame, FrameDecoder, FramingError};
pub use line::{parse_line, LineDecoder};
pub use query::parse_request;
pub use reply::Reply;
