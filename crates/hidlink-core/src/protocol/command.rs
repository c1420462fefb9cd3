//! The normalized, transport-independent command model.
//!
//! Every front-end (binary frames, text lines, HTTP query parameters) decodes
//! into a [`Command`].  All validation and clamping happens while the command is
//! built, so a `Command` value is always within range and can be executed
//! without further checks.

use std::fmt;
use std::num::IntErrorKind;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::hid::HidKeyCode;

/// Maximum simultaneous key codes in one HID keyboard report.
pub const MAX_KEYS: usize = 6;

/// Errors produced while turning decoded input into a [`Command`].
///
/// None of these are fatal: the offending command is answered (or, for the
/// binary protocol, logged) and the decoder carries on with the next one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A positional argument of a text command is absent.
    #[error("{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    /// A named query parameter is absent.
    #[error("{0} is required")]
    Required(&'static str),

    /// A numeric field is not a decimal integer.
    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A key-list token is neither a usage code nor a mappable character.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// A binary payload is too short for the fields its command declares.
    #[error("malformed {command} payload: {reason}")]
    MalformedPayload {
        command: &'static str,
        reason: String,
    },

    /// The keyword, route, or command ID is not recognised.
    #[error("unknown cmd: {0}")]
    Unknown(String),
}

// ── Clamping ──────────────────────────────────────────────────────────────────

/// Saturates `value` into the signed 8-bit range used for motion and wheel deltas.
pub fn saturate_i8(value: i64) -> i8 {
    value.clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8
}

/// Saturates `value` into the unsigned 8-bit range used for masks and key codes.
pub fn saturate_u8(value: i64) -> u8 {
    value.clamp(0, i64::from(u8::MAX)) as u8
}

/// Saturates a millisecond count into a [`Duration`], treating negatives as zero.
pub fn saturate_millis(value: i64) -> Duration {
    Duration::from_millis(value.clamp(0, i64::from(u32::MAX)) as u64)
}

/// Parses a decimal integer field, saturating values that overflow `i64`.
///
/// # Errors
///
/// Returns [`CommandError::InvalidNumber`] if `token` is empty or not an integer.
pub fn parse_int(token: &str, field: &'static str) -> Result<i64, CommandError> {
    match token.trim().parse::<i64>() {
        Ok(v) => Ok(v),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(CommandError::InvalidNumber {
                field,
                value: token.to_string(),
            }),
        },
    }
}

// ── Bitmask types ─────────────────────────────────────────────────────────────

/// Modifier key bitmask.
///
/// Bit layout (same as the HID boot-keyboard modifier byte):
/// - Bit 0: Left Ctrl
/// - Bit 1: Left Shift
/// - Bit 2: Left Alt
/// - Bit 3: Left GUI
/// - Bit 4: Right Ctrl
/// - Bit 5: Right Shift
/// - Bit 6: Right Alt
/// - Bit 7: Right GUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierMask(pub u8);

impl ModifierMask {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_GUI: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_GUI: u8 = 1 << 7;

    /// Iterates the HID usages of the set modifiers, lowest bit first.
    pub fn keys(self) -> impl Iterator<Item = HidKeyCode> {
        (0..8u8)
            .filter(move |bit| self.0 & (1 << bit) != 0)
            .filter_map(HidKeyCode::modifier_for_bit)
    }

    /// Returns `true` if no modifier bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the mask with `bits` added.
    pub fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }
}

/// A physical mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// All buttons in mask bit order.
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    /// The mask bit this button occupies.
    pub fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 0x01,
            MouseButton::Right => 0x02,
            MouseButton::Middle => 0x04,
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        };
        f.write_str(name)
    }
}

/// Mouse button bitmask: bit 0 Left, bit 1 Right, bit 2 Middle.
///
/// Bits 3–7 are reserved and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    /// Iterates the set buttons in Left, Right, Middle order.
    pub fn iter(self) -> impl Iterator<Item = MouseButton> {
        MouseButton::ALL
            .into_iter()
            .filter(move |b| self.0 & b.bit() != 0)
    }

    /// Returns `true` if none of the three button bits is set.
    pub fn is_empty(self) -> bool {
        self.iter().next().is_none()
    }
}

// ── Key list ──────────────────────────────────────────────────────────────────

/// Up to [`MAX_KEYS`] HID usage codes in press order.
///
/// A bounds-checked fixed-capacity container: pushes beyond capacity are
/// refused rather than written.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyList {
    codes: [u8; MAX_KEYS],
    len: usize,
}

impl KeyList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `code`, returning `false` if the list is already full.
    pub fn push(&mut self, code: u8) -> bool {
        match self.codes.get_mut(self.len) {
            Some(slot) => {
                *slot = code;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    /// Builds a list from the first [`MAX_KEYS`] codes of `codes`.
    pub fn truncated(codes: &[u8]) -> Self {
        let mut list = Self::new();
        for &code in codes.iter().take(MAX_KEYS) {
            list.push(code);
        }
        list
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.codes[..self.len]
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_KEYS
    }
}

impl fmt::Debug for KeyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Parses a comma-separated list of decimal key codes.
///
/// Empty tokens are skipped; parsing stops once [`MAX_KEYS`] codes are held.
/// Values outside 0–255 saturate.
///
/// # Errors
///
/// Returns [`CommandError::InvalidNumber`] for a non-numeric token.
pub fn parse_key_codes(raw: &str) -> Result<KeyList, CommandError> {
    let mut keys = KeyList::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if keys.is_full() {
            break;
        }
        keys.push(saturate_u8(parse_int(token, "key")?));
    }
    Ok(keys)
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A composite press of modifiers, keys and mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCombo {
    pub modifiers: ModifierMask,
    pub keys: KeyList,
    pub mouse_buttons: MouseButtons,
    /// How long to keep everything pressed before the optional release.
    pub hold: Option<Duration>,
    /// Release everything afterwards; otherwise the combo stays held until a
    /// [`Command::KeyRelease`].
    pub release: bool,
}

impl KeyCombo {
    /// A keyboard-only combo released right after the settle delay.
    pub fn tap(modifiers: ModifierMask, keys: KeyList) -> Self {
        Self {
            modifiers,
            keys,
            mouse_buttons: MouseButtons::default(),
            hold: None,
            release: true,
        }
    }
}

/// One input-injection command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Liveness query; never touches the actuator.
    Ping,
    MouseMove { dx: i8, dy: i8 },
    MouseClick { buttons: MouseButtons },
    MouseWheel { delta: i8 },
    KeyCombo(KeyCombo),
    /// Releases every held key and mouse button.
    KeyRelease,
    /// Characters emitted one keystroke at a time.
    TypeText { text: String },
}

impl Command {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::MouseMove { .. } => "mouse-move",
            Command::MouseClick { .. } => "mouse-click",
            Command::MouseWheel { .. } => "mouse-wheel",
            Command::KeyCombo(_) => "key-combo",
            Command::KeyRelease => "key-release",
            Command::TypeText { .. } => "type-text",
        }
    }

    /// Returns `true` for commands that drive the actuator.
    pub fn is_actuation(&self) -> bool {
        !matches!(self, Command::Ping)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Clamping ──────────────────────────────────────────────────────────────

    #[test]
    fn test_saturate_i8_clamps_both_ends() {
        assert_eq!(saturate_i8(200), 127);
        assert_eq!(saturate_i8(-500), -128);
        assert_eq!(saturate_i8(-7), -7);
    }

    #[test]
    fn test_saturate_i8_is_idempotent() {
        for v in [-10_000i64, -129, -128, -1, 0, 1, 127, 128, 10_000] {
            let once = saturate_i8(v);
            assert_eq!(saturate_i8(i64::from(once)), once, "clamp({v}) not idempotent");
        }
    }

    #[test]
    fn test_saturate_u8_clamps_negative_to_zero() {
        assert_eq!(saturate_u8(-1), 0);
        assert_eq!(saturate_u8(256), 255);
    }

    #[test]
    fn test_saturate_millis_treats_negative_as_zero() {
        assert_eq!(saturate_millis(-50), Duration::ZERO);
        assert_eq!(saturate_millis(50), Duration::from_millis(50));
    }

    #[test]
    fn test_parse_int_saturates_overflowing_literals() {
        assert_eq!(parse_int("99999999999999999999", "dx"), Ok(i64::MAX));
        assert_eq!(parse_int("-99999999999999999999", "dx"), Ok(i64::MIN));
    }

    #[test]
    fn test_parse_int_rejects_text() {
        let err = parse_int("abc", "dx").unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidNumber { field: "dx", value: "abc".to_string() }
        );
    }

    // ── Masks ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_modifier_mask_0x81_yields_left_ctrl_and_right_gui_only() {
        // Arrange
        let mask = ModifierMask(0x81);

        // Act
        let keys: Vec<HidKeyCode> = mask.keys().collect();

        // Assert
        assert_eq!(keys, vec![HidKeyCode::ControlLeft, HidKeyCode::MetaRight]);
    }

    #[test]
    fn test_mouse_buttons_ignore_reserved_bits() {
        let buttons = MouseButtons(0xF8);
        assert!(buttons.is_empty());
        assert_eq!(buttons.iter().count(), 0);
    }

    #[test]
    fn test_mouse_buttons_mask_5_is_left_and_middle() {
        let buttons: Vec<MouseButton> = MouseButtons(5).iter().collect();
        assert_eq!(buttons, vec![MouseButton::Left, MouseButton::Middle]);
    }

    // ── Key lists ─────────────────────────────────────────────────────────────

    #[test]
    fn test_key_list_refuses_seventh_code() {
        let mut list = KeyList::new();
        for code in 1..=6 {
            assert!(list.push(code));
        }
        assert!(!list.push(7));
        assert_eq!(list.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_key_codes_truncates_at_six() {
        let list = parse_key_codes("1,2,3,4,5,6,7,8,9").unwrap();
        assert_eq!(list.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_key_codes_skips_empty_tokens_without_shifting_values() {
        let list = parse_key_codes("4,,5").unwrap();
        assert_eq!(list.as_slice(), &[4, 5]);
    }

    #[test]
    fn test_parse_key_codes_trims_whitespace_around_tokens() {
        let list = parse_key_codes(" 4 , 5 ,").unwrap();
        assert_eq!(list.as_slice(), &[4, 5]);
    }

    #[test]
    fn test_parse_key_codes_rejects_non_numeric_token() {
        assert!(matches!(
            parse_key_codes("4,x"),
            Err(CommandError::InvalidNumber { field: "key", .. })
        ));
    }

    #[test]
    fn test_command_error_unknown_renders_keyword() {
        assert_eq!(CommandError::Unknown("FOO".into()).to_string(), "unknown cmd: FOO");
    }
}
