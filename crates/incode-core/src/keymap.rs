use crate::types::ScKey;
use std::collections::HashMap;

/// Scancode (set 1) to key name for a standard US/ISO keyboard.
/// Names are lower-case; they are both the binding vocabulary of the config
/// file and the text the abbreviation matcher sees for a key.
pub const KEY_NAMES: &[(ScKey, &str)] = &[
    (ScKey::new(0x01, false), "escape"),
    // Number row
    (ScKey::new(0x02, false), "1"),
    (ScKey::new(0x03, false), "2"),
    (ScKey::new(0x04, false), "3"),
    (ScKey::new(0x05, false), "4"),
    (ScKey::new(0x06, false), "5"),
    (ScKey::new(0x07, false), "6"),
    (ScKey::new(0x08, false), "7"),
    (ScKey::new(0x09, false), "8"),
    (ScKey::new(0x0A, false), "9"),
    (ScKey::new(0x0B, false), "0"),
    (ScKey::new(0x0C, false), "-"),
    (ScKey::new(0x0D, false), "="),
    (ScKey::new(0x0E, false), "backspace"),
    (ScKey::new(0x0F, false), "tab"),
    // QWERTY row
    (ScKey::new(0x10, false), "q"),
    (ScKey::new(0x11, false), "w"),
    (ScKey::new(0x12, false), "e"),
    (ScKey::new(0x13, false), "r"),
    (ScKey::new(0x14, false), "t"),
    (ScKey::new(0x15, false), "y"),
    (ScKey::new(0x16, false), "u"),
    (ScKey::new(0x17, false), "i"),
    (ScKey::new(0x18, false), "o"),
    (ScKey::new(0x19, false), "p"),
    (ScKey::new(0x1A, false), "["),
    (ScKey::new(0x1B, false), "]"),
    (ScKey::new(0x1C, false), "enter"),
    (ScKey::new(0x1D, false), "lcontrol"),
    // ASDF row
    (ScKey::new(0x1E, false), "a"),
    (ScKey::new(0x1F, false), "s"),
    (ScKey::new(0x20, false), "d"),
    (ScKey::new(0x21, false), "f"),
    (ScKey::new(0x22, false), "g"),
    (ScKey::new(0x23, false), "h"),
    (ScKey::new(0x24, false), "j"),
    (ScKey::new(0x25, false), "k"),
    (ScKey::new(0x26, false), "l"),
    (ScKey::new(0x27, false), ";"),
    (ScKey::new(0x28, false), "'"),
    (ScKey::new(0x29, false), "`"),
    (ScKey::new(0x2A, false), "lshift"),
    (ScKey::new(0x2B, false), "\\"),
    // ZXCV row
    (ScKey::new(0x2C, false), "z"),
    (ScKey::new(0x2D, false), "x"),
    (ScKey::new(0x2E, false), "c"),
    (ScKey::new(0x2F, false), "v"),
    (ScKey::new(0x30, false), "b"),
    (ScKey::new(0x31, false), "n"),
    (ScKey::new(0x32, false), "m"),
    (ScKey::new(0x33, false), ","),
    (ScKey::new(0x34, false), "."),
    (ScKey::new(0x35, false), "/"),
    (ScKey::new(0x36, false), "rshift"),
    (ScKey::new(0x38, false), "lalt"),
    (ScKey::new(0x39, false), "space"),
    (ScKey::new(0x3A, false), "capslock"),
    (ScKey::new(0x56, false), "oem_backslash"), // ISO key left of Z
    // Extended
    (ScKey::new(0x1D, true), "rcontrol"),
    (ScKey::new(0x38, true), "ralt"),
    (ScKey::new(0x47, true), "home"),
    (ScKey::new(0x48, true), "up"),
    (ScKey::new(0x49, true), "pageup"),
    (ScKey::new(0x4B, true), "left"),
    (ScKey::new(0x4D, true), "right"),
    (ScKey::new(0x4F, true), "end"),
    (ScKey::new(0x50, true), "down"),
    (ScKey::new(0x51, true), "pagedown"),
    (ScKey::new(0x52, true), "insert"),
    (ScKey::new(0x53, true), "delete"),
    (ScKey::new(0x5B, true), "lwin"),
    (ScKey::new(0x5C, true), "rwin"),
    (ScKey::new(0x5D, true), "apps"),
];

lazy_static::lazy_static! {
    static ref BY_KEY: HashMap<ScKey, &'static str> = KEY_NAMES.iter().copied().collect();
    static ref BY_NAME: HashMap<&'static str, ScKey> =
        KEY_NAMES.iter().map(|(k, n)| (*n, *k)).collect();
}

pub fn key_name(key: ScKey) -> Option<&'static str> {
    BY_KEY.get(&key).copied()
}

/// Case-insensitive lookup of a configured key name.
pub fn key_by_name(name: &str) -> Option<ScKey> {
    BY_NAME.get(name.trim().to_ascii_lowercase().as_str()).copied()
}

/// Textual form of a key as seen by the abbreviation matcher.
/// Unnamed keys render as their raw scancode so they never match a trigger.
pub fn key_text(key: ScKey) -> String {
    match key_name(key) {
        Some(name) => name.to_string(),
        None => format!("<{:02x}{}>", key.sc, if key.ext { "e" } else { "" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        assert_eq!(BY_KEY.len(), KEY_NAMES.len());
        assert_eq!(BY_NAME.len(), KEY_NAMES.len());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(key_by_name("RControl"), Some(ScKey::new(0x1D, true)));
        assert_eq!(key_by_name(" Space "), Some(ScKey::new(0x39, false)));
        assert_eq!(key_by_name("nope"), None);
    }

    #[test]
    fn test_extended_flag_distinguishes_keys() {
        assert_eq!(key_name(ScKey::new(0x1D, false)), Some("lcontrol"));
        assert_eq!(key_name(ScKey::new(0x1D, true)), Some("rcontrol"));
    }

    #[test]
    fn test_key_text() {
        assert_eq!(key_text(ScKey::new(0x14, false)), "t");
        assert_eq!(key_text(ScKey::new(0x7E, true)), "<7ee>");
    }
}
