//! Query-parameter adapter for HTTP-style requests.
//!
//! One request carries one command.  The route selects the command and named
//! parameters supply its fields:
//!
//! | Route         | Parameters                                      |
//! |---------------|-------------------------------------------------|
//! | `ping`        |                                                 |
//! | `mouse/move`  | `dx`, `dy`                                      |
//! | `mouse/click` | `buttons`                                       |
//! | `mouse/wheel` | `v`                                             |
//! | `key/type`    | `text`                                          |
//! | `key/combo`   | `mods`, `keys`                                  |
//! | `combo`       | `mods`, `keys`, `mouse`?, `duration_ms`?, `release`? |
//!
//! Unlike the line and binary protocols, key lists here may name a key by the
//! printable character it types (`keys=c` instead of `keys=6`).

use std::collections::HashMap;

use super::command::{
    parse_int, saturate_i8, saturate_millis, saturate_u8, Command, CommandError, KeyCombo,
    KeyList, ModifierMask, MouseButtons,
};
use crate::keymap::ascii::char_to_hid;

/// Translates a route plus its parameters into a [`Command`].
///
/// A leading `/` on `route` is ignored.
///
/// # Errors
///
/// - [`CommandError::Required`] when a mandatory parameter is absent.
/// - [`CommandError::InvalidNumber`] / [`CommandError::InvalidKey`] for bad values.
/// - [`CommandError::Unknown`] for an unrecognised route.
pub fn parse_request(route: &str, params: &HashMap<String, String>) -> Result<Command, CommandError> {
    let route = route.trim_start_matches('/');
    match route {
        "ping" => Ok(Command::Ping),
        "mouse/move" => Ok(Command::MouseMove {
            dx: saturate_i8(int(params, "dx")?),
            dy: saturate_i8(int(params, "dy")?),
        }),
        "mouse/click" => Ok(Command::MouseClick {
            buttons: MouseButtons(saturate_u8(int(params, "buttons")?)),
        }),
        "mouse/wheel" => Ok(Command::MouseWheel {
            delta: saturate_i8(int(params, "v")?),
        }),
        "key/type" => Ok(Command::TypeText {
            text: required(params, "text")?.to_string(),
        }),
        "key/combo" => {
            let (modifiers, keys) = modifiers_and_keys(params)?;
            Ok(Command::KeyCombo(KeyCombo::tap(modifiers, keys)))
        }
        "combo" => {
            let (modifiers, keys) = modifiers_and_keys(params)?;
            Ok(Command::KeyCombo(KeyCombo {
                modifiers,
                keys,
                mouse_buttons: MouseButtons(saturate_u8(int_or(params, "mouse", 0)?)),
                hold: Some(saturate_millis(int_or(params, "duration_ms", 0)?)),
                release: int_or(params, "release", 1)? != 0,
            }))
        }
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Parses `mods` and `keys`, folding Left-Shift into the mask for any key
/// given as a shifted character.
fn modifiers_and_keys(params: &HashMap<String, String>) -> Result<(ModifierMask, KeyList), CommandError> {
    let mut modifiers = ModifierMask(saturate_u8(int(params, "mods")?));
    let mut keys = KeyList::new();

    for token in required(params, "keys")?
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        if keys.is_full() {
            break;
        }
        let (code, shift) = key_token(token)?;
        if shift {
            modifiers = modifiers.with(ModifierMask::LEFT_SHIFT);
        }
        keys.push(code);
    }
    Ok((modifiers, keys))
}

/// An all-digit token is a usage code; a single character is looked up in the
/// US layout.
fn key_token(token: &str) -> Result<(u8, bool), CommandError> {
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return Ok((saturate_u8(parse_int(token, "key")?), false));
    }

    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => char_to_hid(ch)
            .map(|k| (k.key.as_u8(), k.shift))
            .ok_or_else(|| CommandError::InvalidKey(token.to_string())),
        _ => Err(CommandError::InvalidKey(token.to_string())),
    }
}

fn required<'a>(params: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, CommandError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or(CommandError::Required(name))
}

fn int(params: &HashMap<String, String>, name: &'static str) -> Result<i64, CommandError> {
    parse_int(required(params, name)?, name)
}

fn int_or(params: &HashMap<String, String>, name: &'static str, default: i64) -> Result<i64, CommandError> {
    match params.get(name) {
        Some(value) => parse_int(value, name),
        None => Ok(default),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
