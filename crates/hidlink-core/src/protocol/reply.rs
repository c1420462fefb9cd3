//! Acknowledgement tokens sent back on text transports.

use std::fmt;

use super::command::CommandError;

/// Outcome of one command as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Err(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Err(reason) => write!(f, "ERR {reason}"),
        }
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Err(err.to_string())
    }
}
