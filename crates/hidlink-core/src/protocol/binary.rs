//! Command mapping for the binary frame protocol.
//!
//! Each verified [`Frame`] carries one command.  Payload layouts:
//!
//! | ID     | Command     | Payload                              |
//! |--------|-------------|--------------------------------------|
//! | `0x01` | MouseMove   | `dx: i8`, `dy: i8`                   |
//! | `0x02` | MouseClick  | `mask: u8`                           |
//! | `0x03` | MouseWheel  | `delta: i8`                          |
//! | `0x10` | KeyCombo    | `mods: u8`, `count: u8`, `keys[count]` |
//! | `0x11` | KeyRelease  | (none)                               |
//! | `0x12` | TypeText    | `len: u8`, `chars[len]`              |
//!
//! Trailing bytes past the declared fields are ignored.  The protocol has no
//! acknowledgement channel, so decode failures are only visible in the logs.

use super::command::{Command, CommandError, KeyCombo, KeyList, ModifierMask, MouseButtons};
use super::frame::{encode_frame, Frame, MAX_PAYLOAD};

pub const MOUSE_MOVE: u8 = 0x01;
pub const MOUSE_CLICK: u8 = 0x02;
pub const MOUSE_WHEEL: u8 = 0x03;
pub const KEY_COMBO: u8 = 0x10;
pub const KEY_RELEASE: u8 = 0x11;
pub const TYPE_TEXT: u8 = 0x12;

/// Largest text a single `TypeText` frame carries (payload minus the length byte).
pub const MAX_TEXT_BYTES: usize = MAX_PAYLOAD - 1;

/// Translates a checksum-verified frame into a [`Command`].
///
/// # Errors
///
/// - [`CommandError::MalformedPayload`] if the payload is shorter than its
///   command requires, or a declared count runs past the end of the payload.
/// - [`CommandError::Unknown`] for an unassigned command ID.
pub fn decode_command(frame: &Frame<'_>) -> Result<Command, CommandError> {
    let p = frame.payload;
    match frame.command_id {
        MOUSE_MOVE => {
            let [dx, dy] = fixed::<2>(p, "mouse-move")?;
            Ok(Command::MouseMove {
                dx: dx as i8,
                dy: dy as i8,
            })
        }
        MOUSE_CLICK => {
            let [mask] = fixed::<1>(p, "mouse-click")?;
            Ok(Command::MouseClick {
                buttons: MouseButtons(mask),
            })
        }
        MOUSE_WHEEL => {
            let [delta] = fixed::<1>(p, "mouse-wheel")?;
            Ok(Command::MouseWheel { delta: delta as i8 })
        }
        KEY_COMBO => {
            let [mods, count] = fixed::<2>(p, "key-combo")?;
            let keys = counted(&p[2..], count, "key-combo")?;
            Ok(Command::KeyCombo(KeyCombo::tap(
                ModifierMask(mods),
                KeyList::truncated(keys),
            )))
        }
        KEY_RELEASE => Ok(Command::KeyRelease),
        TYPE_TEXT => {
            let [len] = fixed::<1>(p, "type-text")?;
            let bytes = counted(&p[1..], len, "type-text")?;
            Ok(Command::TypeText {
                text: String::from_utf8_lossy(bytes).into_owned(),
            })
        }
        other => Err(CommandError::Unknown(format!("0x{other:02X}"))),
    }
}

/// Builds the complete wire frame for `command`.
///
/// Returns `None` for [`Command::Ping`], which has no binary form, and for text
/// longer than [`MAX_TEXT_BYTES`].  Combo fields the binary layout cannot carry
/// (mouse buttons, hold, release flag) are not encoded.
pub fn encode_command(command: &Command) -> Option<Vec<u8>> {
    let (id, payload): (u8, Vec<u8>) = match command {
        Command::Ping => return None,
        Command::MouseMove { dx, dy } => (MOUSE_MOVE, vec![*dx as u8, *dy as u8]),
        Command::MouseClick { buttons } => (MOUSE_CLICK, vec![buttons.0]),
        Command::MouseWheel { delta } => (MOUSE_WHEEL, vec![*delta as u8]),
        Command::KeyCombo(combo) => {
            let keys = combo.keys.as_slice();
            let mut payload = Vec::with_capacity(2 + keys.len());
            payload.push(combo.modifiers.0);
            payload.push(keys.len() as u8);
            payload.extend_from_slice(keys);
            (KEY_COMBO, payload)
        }
        Command::KeyRelease => (KEY_RELEASE, Vec::new()),
        Command::TypeText { text } => {
            let bytes = text.as_bytes();
            if bytes.len() > MAX_TEXT_BYTES {
                return None;
            }
            let mut payload = Vec::with_capacity(1 + bytes.len());
            payload.push(bytes.len() as u8);
            payload.extend_from_slice(bytes);
            (TYPE_TEXT, payload)
        }
    };
    encode_frame(id, &payload).ok()
}

// ── Payload helpers ───────────────────────────────────────────────────────────

fn fixed<const N: usize>(payload: &[u8], command: &'static str) -> Result<[u8; N], CommandError> {
    payload
        .get(..N)
        .and_then(|head| <[u8; N]>::try_from(head).ok())
        .ok_or_else(|| CommandError::MalformedPayload {
            command,
            reason: format!("expected at least {N} bytes, got {}", payload.len()),
        })
}

fn counted<'a>(rest: &'a [u8], count: u8, command: &'static str) -> Result<&'a [u8], CommandError> {
    rest.get(..usize::from(count))
        .ok_or_else(|| CommandError::MalformedPayload {
            command,
            reason: format!("count {count} exceeds the {} bytes that follow", rest.len()),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(command_id: u8, payload: &[u8]) -> Frame<'_> {
        Frame { command_id, payload }
    }

    #[test]
    fn test_mouse_move_reads_signed_deltas() {
        // Arrange
        let payload = [0x05, 0xFB];

        // Act
        let cmd = decode_command(&frame(MOUSE_MOVE, &payload)).unwrap();

        // Assert
        assert_eq!(cmd, Command::MouseMove { dx: 5, dy: -5 });
    }

    #[test]
    fn test_mouse_move_with_one_byte_is_malformed() {
        let err = decode_command(&frame(MOUSE_MOVE, &[0x05])).unwrap_err();
        assert!(matches!(err, CommandError::MalformedPayload { command: "mouse-move", .. }));
    }

    #[test]
    fn test_mouse_click_keeps_raw_mask() {
        let cmd = decode_command(&frame(MOUSE_CLICK, &[0xFF])).unwrap();
        assert_eq!(cmd, Command::MouseClick { buttons: MouseButtons(0xFF) });
    }

    #[test]
    fn test_mouse_wheel_negative_delta() {
        let cmd = decode_command(&frame(MOUSE_WHEEL, &[0x80])).unwrap();
        assert_eq!(cmd, Command::MouseWheel { delta: -128 });
    }

    #[test]
    fn test_key_combo_decodes_as_auto_released_tap() {
        // Arrange – Left Ctrl + Left Shift, keys 'a' and 'b'
        let payload = [0x03, 0x02, 0x04, 0x05];

        // Act
        let cmd = decode_command(&frame(KEY_COMBO, &payload)).unwrap();

        // Assert
        let Command::KeyCombo(combo) = cmd else {
            panic!("expected KeyCombo, got {cmd:?}");
        };
        assert_eq!(combo.modifiers, ModifierMask(0x03));
        assert_eq!(combo.keys.as_slice(), &[0x04, 0x05]);
        assert!(combo.release);
        assert_eq!(combo.hold, None);
        assert!(combo.mouse_buttons.is_empty());
    }

    #[test]
    fn test_key_combo_truncates_eight_keys_to_six() {
        let payload = [0x00, 0x08, 1, 2, 3, 4, 5, 6, 7, 8];
        let Command::KeyCombo(combo) = decode_command(&frame(KEY_COMBO, &payload)).unwrap() else {
            panic!("expected KeyCombo");
        };
        assert_eq!(combo.keys.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_key_combo_count_past_payload_end_is_malformed() {
        let err = decode_command(&frame(KEY_COMBO, &[0x00, 0x03, 0x04])).unwrap_err();
        assert!(matches!(err, CommandError::MalformedPayload { command: "key-combo", .. }));
    }

    #[test]
    fn test_key_release_ignores_payload() {
        assert_eq!(decode_command(&frame(KEY_RELEASE, &[])).unwrap(), Command::KeyRelease);
        assert_eq!(decode_command(&frame(KEY_RELEASE, &[9, 9])).unwrap(), Command::KeyRelease);
    }

    #[test]
    fn test_type_text_reads_declared_length_only() {
        let payload = [0x02, b'h', b'i', b'!'];
        let cmd = decode_command(&frame(TYPE_TEXT, &payload)).unwrap();
        assert_eq!(cmd, Command::TypeText { text: "hi".to_string() });
    }

    #[test]
    fn test_type_text_empty_is_valid() {
        let cmd = decode_command(&frame(TYPE_TEXT, &[0x00])).unwrap();
        assert_eq!(cmd, Command::TypeText { text: String::new() });
    }

    #[test]
    fn test_unknown_id_names_the_byte() {
        let err = decode_command(&frame(0x7F, &[])).unwrap_err();
        assert_eq!(err, CommandError::Unknown("0x7F".to_string()));
    }

    #[test]
    fn test_encode_mouse_move_matches_reference_bytes() {
        let bytes = encode_command(&Command::MouseMove { dx: 5, dy: 6 }).unwrap();
        assert_eq!(bytes, vec![0xAA, 0x03, 0x01, 0x05, 0x06, 0x01]);
    }

    #[test]
    fn test_encode_ping_has_no_binary_form() {
        assert_eq!(encode_command(&Command::Ping), None);
    }

    #[test]
    fn test_encode_rejects_text_longer_than_one_frame() {
        let text = "x".repeat(MAX_TEXT_BYTES + 1);
        assert_eq!(encode_command(&Command::TypeText { text }), None);
    }
}
