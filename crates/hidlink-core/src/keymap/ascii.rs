//! Printable ASCII to HID usage translation (US layout).
//!
//! Used by the query-parameter adapter, whose key lists may name keys by the
//! character they produce instead of by usage code.

use super::hid::HidKeyCode;

/// A HID key plus whether Shift must be held to produce the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiKey {
    pub key: HidKeyCode,
    pub shift: bool,
}

impl AsciiKey {
    const fn plain(key: HidKeyCode) -> Self {
        Self { key, shift: false }
    }

    const fn shifted(key: HidKeyCode) -> Self {
        Self { key, shift: true }
    }
}

/// Translates `ch` to the key that types it on a US keyboard.
///
/// Returns `None` for characters outside printable ASCII plus `\n` and `\t`.
pub fn char_to_hid(ch: char) -> Option<AsciiKey> {
    use HidKeyCode as K;

    if ch.is_ascii_lowercase() {
        return letter(ch as u8 - b'a').map(AsciiKey::plain);
    }
    if ch.is_ascii_uppercase() {
        return letter(ch as u8 - b'A').map(AsciiKey::shifted);
    }

    let mapped = match ch {
        '1' => AsciiKey::plain(K::Digit1),
        '2' => AsciiKey::plain(K::Digit2),
        '3' => AsciiKey::plain(K::Digit3),
        '4' => AsciiKey::plain(K::Digit4),
        '5' => AsciiKey::plain(K::Digit5),
        '6' => AsciiKey::plain(K::Digit6),
        '7' => AsciiKey::plain(K::Digit7),
        '8' => AsciiKey::plain(K::Digit8),
        '9' => AsciiKey::plain(K::Digit9),
        '0' => AsciiKey::plain(K::Digit0),
        '!' => AsciiKey::shifted(K::Digit1),
        '@' => AsciiKey::shifted(K::Digit2),
        '#' => AsciiKey::shifted(K::Digit3),
        '$' => AsciiKey::shifted(K::Digit4),
        '%' => AsciiKey::shifted(K::Digit5),
        '^' => AsciiKey::shifted(K::Digit6),
        '&' => AsciiKey::shifted(K::Digit7),
        '*' => AsciiKey::shifted(K::Digit8),
        '(' => AsciiKey::shifted(K::Digit9),
        ')' => AsciiKey::shifted(K::Digit0),
        '\n' => AsciiKey::plain(K::Enter),
        '\t' => AsciiKey::plain(K::Tab),
        ' ' => AsciiKey::plain(K::Space),
        '-' => AsciiKey::plain(K::Minus),
        '_' => AsciiKey::shifted(K::Minus),
        '=' => AsciiKey::plain(K::Equal),
        '+' => AsciiKey::shifted(K::Equal),
        '[' => AsciiKey::plain(K::BracketLeft),
        '{' => AsciiKey::shifted(K::BracketLeft),
        ']' => AsciiKey::plain(K::BracketRight),
        '}' => AsciiKey::shifted(K::BracketRight),
        '\\' => AsciiKey::plain(K::Backslash),
        '|' => AsciiKey::shifted(K::Backslash),
        ';' => AsciiKey::plain(K::Semicolon),
        ':' => AsciiKey::shifted(K::Semicolon),
        '\'' => AsciiKey::plain(K::Quote),
        '"' => AsciiKey::shifted(K::Quote),
        '`' => AsciiKey::plain(K::Backquote),
        '~' => AsciiKey::shifted(K::Backquote),
        ',' => AsciiKey::plain(K::Comma),
        '<' => AsciiKey::shifted(K::Comma),
        '.' => AsciiKey::plain(K::Period),
        '>' => AsciiKey::shifted(K::Period),
        '/' => AsciiKey::plain(K::Slash),
        '?' => AsciiKey::shifted(K::Slash),
        _ => return None,
    };
    Some(mapped)
}

fn letter(index: u8) -> Option<HidKeyCode> {
    use HidKeyCode as K;
    const LETTERS: [HidKeyCode; 26] = [
        K::KeyA, K::KeyB, K::KeyC, K::KeyD, K::KeyE, K::KeyF, K::KeyG, K::KeyH, K::KeyI,
        K::KeyJ, K::KeyK, K::KeyL, K::KeyM, K::KeyN, K::KeyO, K::KeyP, K::KeyQ, K::KeyR,
        K::KeyS, K::KeyT, K::KeyU, K::KeyV, K::KeyW, K::KeyX, K::KeyY, K::KeyZ,
    ];
    LETTERS.get(usize::from(index)).copied()
}
