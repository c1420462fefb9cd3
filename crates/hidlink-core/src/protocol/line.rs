//! Newline-terminated text protocol.
//!
//! Bytes accumulate in a bounded buffer until `\n`.  `\r` is ignored so both
//! `\n` and `\r\n` hosts work.  Each completed line carries one command:
//!
//! ```text
//! PING
//! MOVE dx dy
//! CLICK mask
//! WHEEL v
//! TYPE <rest of line>
//! KCOMBO mods k1,k2,...
//! COMBO mods k1,k2,... mouse duration_ms release
//! RELEASE
//! ```
//!
//! Keywords are case-insensitive.  Numbers are decimal and saturate into range.

use super::command::{
    parse_int, parse_key_codes, saturate_i8, saturate_millis, saturate_u8, Command, CommandError,
    KeyCombo, ModifierMask, MouseButtons,
};

/// Line buffer capacity in bytes.  Bytes past this point are dropped until the
/// next newline.
pub const LINE_CAPACITY: usize = 256;

/// Accumulates bytes into lines.
#[derive(Debug)]
pub struct LineDecoder {
    buf: Vec<u8>,
    overflowed: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(LINE_CAPACITY),
            overflowed: false,
        }
    }

    /// Consumes one byte, returning the completed line on `\n`.
    ///
    /// Empty lines produce nothing.  Invalid UTF-8 is replaced, not rejected.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' => None,
            b'\n' => {
                if self.overflowed {
                    tracing::debug!(capacity = LINE_CAPACITY, "line truncated at buffer capacity");
                    self.overflowed = false;
                }
                if self.buf.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                Some(line)
            }
            _ => {
                if self.buf.len() < LINE_CAPACITY {
                    self.buf.push(byte);
                } else {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Bytes currently buffered.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Parses one text line into a [`Command`].
///
/// # Errors
///
/// Returns [`CommandError::MissingArgument`] when a positional field is absent,
/// [`CommandError::InvalidNumber`] for a non-numeric field, and
/// [`CommandError::Unknown`] (carrying the upper-cased keyword) otherwise.
pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (keyword, rest) = line.split_once(' ').unwrap_or((line, ""));
    let keyword = keyword.to_ascii_uppercase();
    let mut fields = rest.split_whitespace();

    match keyword.as_str() {
        "PING" => Ok(Command::Ping),
        "MOVE" => {
            let (Some(dx), Some(dy)) = (fields.next(), fields.next()) else {
                return Err(missing("MOVE", "dx dy"));
            };
            Ok(Command::MouseMove {
                dx: saturate_i8(parse_int(dx, "dx")?),
                dy: saturate_i8(parse_int(dy, "dy")?),
            })
        }
        "CLICK" => {
            let mask = fields.next().ok_or_else(|| missing("CLICK", "mask"))?;
            Ok(Command::MouseClick {
                buttons: MouseButtons(saturate_u8(parse_int(mask, "mask")?)),
            })
        }
        "WHEEL" => {
            let v = fields.next().ok_or_else(|| missing("WHEEL", "v"))?;
            Ok(Command::MouseWheel {
                delta: saturate_i8(parse_int(v, "v")?),
            })
        }
        // Everything after the first separator space, leading spaces included.
        "TYPE" => Ok(Command::TypeText {
            text: rest.to_string(),
        }),
        "KCOMBO" => {
            // The key list is the whole tail, so `4, 5` keeps both keys.
            let Some((mods, keys)) = rest.trim_start().split_once(' ') else {
                return Err(missing("KCOMBO", "mods and keys"));
            };
            Ok(Command::KeyCombo(KeyCombo::tap(
                ModifierMask(saturate_u8(parse_int(mods, "mods")?)),
                parse_key_codes(keys)?,
            )))
        }
        "COMBO" => {
            let parts: Vec<&str> = fields.take(5).collect();
            let [mods, keys, mouse, duration, release] = parts[..] else {
                return Err(missing("COMBO", "mods keys mouse duration_ms release"));
            };
            Ok(Command::KeyCombo(KeyCombo {
                modifiers: ModifierMask(saturate_u8(parse_int(mods, "mods")?)),
                keys: parse_key_codes(keys)?,
                mouse_buttons: MouseButtons(saturate_u8(parse_int(mouse, "mouse")?)),
                hold: Some(saturate_millis(parse_int(duration, "duration_ms")?)),
                release: parse_int(release, "release")? != 0,
            }))
        }
        "RELEASE" => Ok(Command::KeyRelease),
        _ => Err(CommandError::Unknown(keyword)),
    }
}

fn missing(command: &'static str, expected: &'static str) -> CommandError {
    CommandError::MissingArgument { command, expected }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
