//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! Key codes travel through every hidlink protocol as raw `u8` usage IDs, so a
//! host can send any code the actuator understands.  [`HidKeyCode`] names the
//! subset the agent itself needs: the keys reachable from printable ASCII and
//! the eight modifiers.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Modifier usages
//!
//! The eight modifiers occupy the contiguous block 0xE0–0xE7 in the same order
//! as the bits of a HID boot-keyboard modifier byte, so bit `i` of a modifier
//! mask is usage `0xE0 + i`:
//!
//! | Bit | Usage | Key         |
//! |-----|-------|-------------|
//! | 0   | 0xE0  | Left Ctrl   |
//! | 1   | 0xE1  | Left Shift  |
//! | 2   | 0xE2  | Left Alt    |
//! | 3   | 0xE3  | Left GUI    |
//! | 4   | 0xE4  | Right Ctrl  |
//! | 5   | 0xE5  | Right Shift |
//! | 6   | 0xE6  | Right Alt   |
//! | 7   | 0xE7  | Right GUI   |

use serde::{Deserialize, Serialize};

/// First modifier usage (Left Ctrl).  Modifier bit `i` maps to `MODIFIER_BASE + i`.
pub const MODIFIER_BASE: u8 = 0xE0;

/// USB HID Usage ID for keyboard keys (page 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Modifier keys (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl HidKeyCode {
    /// The eight modifiers in modifier-mask bit order.
    pub const MODIFIERS: [HidKeyCode; 8] = [
        HidKeyCode::ControlLeft,
        HidKeyCode::ShiftLeft,
        HidKeyCode::AltLeft,
        HidKeyCode::MetaLeft,
        HidKeyCode::ControlRight,
        HidKeyCode::ShiftRight,
        HidKeyCode::AltRight,
        HidKeyCode::MetaRight,
    ];

    /// Returns the raw USB HID Usage ID value for this key code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the modifier key for mask bit `bit` (0–7), or `None` past bit 7.
    pub fn modifier_for_bit(bit: u8) -> Option<HidKeyCode> {
        Self::MODIFIERS.get(usize::from(bit)).copied()
    }

    /// Returns `true` if this is a modifier key.
    pub fn is_modifier(self) -> bool {
        (MODIFIER_BASE..=MODIFIER_BASE + 7).contains(&self.as_u8())
    }
}
