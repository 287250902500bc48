//! Symbolic evdev name resolution: `KEY_*`, `BTN_*`, `REL_*`, and
//! `EV_*` names to their numeric codes, and back again for
//! `--debug`/log output. Spec §3: "symbolic names and integers are
//! interchangeable."

use input_linux_sys::{EV_ABS, EV_KEY, EV_LED, EV_MSC, EV_REL, EV_REP, EV_SYN};

/// Event-type name → code. Small enough to keep flat; `EV_KEY`/`EV_REL`
/// are the only ones device bindings actually use, the rest are
/// accepted for completeness and `--list-devices` capability lines.
static EV_TYPE_NAMES: phf::Map<&'static str, u16> = phf::phf_map! {
    "EV_SYN" => 0,
    "EV_KEY" => 1,
    "EV_REL" => 2,
    "EV_ABS" => 3,
    "EV_MSC" => 4,
    "EV_LED" => 17,
    "EV_REP" => 20,
};

/// Mouse/joystick button code names (`BTN_*`) to codes.
static BTN_NAMES: phf::Map<&'static str, u16> = phf::phf_map! {
    "BTN_LEFT" => 0x110,
    "BTN_RIGHT" => 0x111,
    "BTN_MIDDLE" => 0x112,
    "BTN_SIDE" => 0x113,
    "BTN_EXTRA" => 0x114,
    "BTN_FORWARD" => 0x115,
    "BTN_BACK" => 0x116,
    "BTN_TASK" => 0x117,
};

/// Relative axis code names (`REL_*`) to codes.
static REL_NAMES: phf::Map<&'static str, u16> = phf::phf_map! {
    "REL_X" => 0,
    "REL_Y" => 1,
    "REL_Z" => 2,
    "REL_RX" => 3,
    "REL_RY" => 4,
    "REL_RZ" => 5,
    "REL_HWHEEL" => 6,
    "REL_DIAL" => 7,
    "REL_WHEEL" => 8,
    "REL_MISC" => 9,
};

/// Keyboard key code names (`KEY_*`) to codes, carried over from the
/// debounce filter's logging table.
static KEY_NAMES: phf::Map<&'static str, u16> = phf::phf_map! {
    "KEY_RESERVED" => 0,
    "KEY_ESC" => 1,
    "KEY_1" => 2,
    "KEY_2" => 3,
    "KEY_3" => 4,
    "KEY_4" => 5,
    "KEY_5" => 6,
    "KEY_6" => 7,
    "KEY_7" => 8,
    "KEY_8" => 9,
    "KEY_9" => 10,
    "KEY_0" => 11,
    "KEY_MINUS" => 12,
    "KEY_EQUAL" => 13,
    "KEY_BACKSPACE" => 14,
    "KEY_TAB" => 15,
    "KEY_Q" => 16,
    "KEY_W" => 17,
    "KEY_E" => 18,
    "KEY_R" => 19,
    "KEY_T" => 20,
    "KEY_Y" => 21,
    "KEY_U" => 22,
    "KEY_I" => 23,
    "KEY_O" => 24,
    "KEY_P" => 25,
    "KEY_LEFTBRACE" => 26,
    "KEY_RIGHTBRACE" => 27,
    "KEY_ENTER" => 28,
    "KEY_LEFTCTRL" => 29,
    "KEY_A" => 30,
    "KEY_S" => 31,
    "KEY_D" => 32,
    "KEY_F" => 33,
    "KEY_G" => 34,
    "KEY_H" => 35,
    "KEY_J" => 36,
    "KEY_K" => 37,
    "KEY_L" => 38,
    "KEY_SEMICOLON" => 39,
    "KEY_APOSTROPHE" => 40,
    "KEY_GRAVE" => 41,
    "KEY_LEFTSHIFT" => 42,
    "KEY_BACKSLASH" => 43,
    "KEY_Z" => 44,
    "KEY_X" => 45,
    "KEY_C" => 46,
    "KEY_V" => 47,
    "KEY_B" => 48,
    "KEY_N" => 49,
    "KEY_M" => 50,
    "KEY_COMMA" => 51,
    "KEY_DOT" => 52,
    "KEY_SLASH" => 53,
    "KEY_RIGHTSHIFT" => 54,
    "KEY_KPASTERISK" => 55,
    "KEY_LEFTALT" => 56,
    "KEY_SPACE" => 57,
    "KEY_CAPSLOCK" => 58,
    "KEY_F1" => 59,
    "KEY_F2" => 60,
    "KEY_F3" => 61,
    "KEY_F4" => 62,
    "KEY_F5" => 63,
    "KEY_F6" => 64,
    "KEY_F7" => 65,
    "KEY_F8" => 66,
    "KEY_F9" => 67,
    "KEY_F10" => 68,
    "KEY_NUMLOCK" => 69,
    "KEY_SCROLLLOCK" => 70,
    "KEY_KP7" => 71,
    "KEY_KP8" => 72,
    "KEY_KP9" => 73,
    "KEY_KPMINUS" => 74,
    "KEY_KP4" => 75,
    "KEY_KP5" => 76,
    "KEY_KP6" => 77,
    "KEY_KPPLUS" => 78,
    "KEY_KP1" => 79,
    "KEY_KP2" => 80,
    "KEY_KP3" => 81,
    "KEY_KP0" => 82,
    "KEY_KPDOT" => 83,
    "KEY_F11" => 87,
    "KEY_F12" => 88,
    "KEY_KPENTER" => 96,
    "KEY_RIGHTCTRL" => 97,
    "KEY_KPSLASH" => 98,
    "KEY_SYSRQ" => 99,
    "KEY_RIGHTALT" => 100,
    "KEY_HOME" => 102,
    "KEY_UP" => 103,
    "KEY_PAGEUP" => 104,
    "KEY_LEFT" => 105,
    "KEY_RIGHT" => 106,
    "KEY_END" => 107,
    "KEY_DOWN" => 108,
    "KEY_PAGEDOWN" => 109,
    "KEY_INSERT" => 110,
    "KEY_DELETE" => 111,
    "KEY_PAUSE" => 119,
    "KEY_LEFTMETA" => 125,
    "KEY_RIGHTMETA" => 126,
    "KEY_COMPOSE" => 127,
};

/// Resolve an `EV_*` type name (case-insensitive) to its numeric code.
pub fn resolve_ev_type(name: &str) -> Option<u16> {
    EV_TYPE_NAMES.get(name.trim().to_ascii_uppercase().as_str()).copied()
}

/// Resolve a `KEY_*`/`BTN_*`/`REL_*` code name (case-insensitive) to
/// its numeric code, trying each namespace in turn.
pub fn resolve_code_name(name: &str) -> Option<u16> {
    let upper = name.trim().to_ascii_uppercase();
    KEY_NAMES
        .get(upper.as_str())
        .or_else(|| BTN_NAMES.get(upper.as_str()))
        .or_else(|| REL_NAMES.get(upper.as_str()))
        .copied()
}

/// Human-readable name for an `EV_KEY`/`BTN_*` code, for `--debug` and
/// log output. Falls back to `"UNKNOWN"`.
pub fn key_name(code: u16) -> &'static str {
    KEY_NAMES
        .entries()
        .find(|(_, v)| **v == code)
        .map(|(k, _)| *k)
        .or_else(|| BTN_NAMES.entries().find(|(_, v)| **v == code).map(|(k, _)| *k))
        .unwrap_or("UNKNOWN")
}

/// Human-readable name for a `REL_*` axis code.
pub fn rel_name(code: u16) -> &'static str {
    REL_NAMES
        .entries()
        .find(|(_, v)| **v == code)
        .map(|(k, _)| *k)
        .unwrap_or("UNKNOWN")
}

/// Human-readable name for an `EV_*` event type code.
pub fn event_type_name(type_: u16) -> &'static str {
    match i32::from(type_) {
        EV_SYN => "EV_SYN",
        EV_KEY => "EV_KEY",
        EV_REL => "EV_REL",
        EV_ABS => "EV_ABS",
        EV_MSC => "EV_MSC",
        EV_LED => "EV_LED",
        EV_REP => "EV_REP",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names_case_insensitively() {
        assert_eq!(resolve_code_name("key_a"), Some(30));
        assert_eq!(resolve_code_name("KEY_A"), Some(30));
        assert_eq!(resolve_code_name("btn_left"), Some(0x110));
        assert_eq!(resolve_code_name("REL_WHEEL"), Some(8));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert_eq!(resolve_code_name("KEY_DOES_NOT_EXIST"), None);
    }

    #[test]
    fn resolves_ev_type_names() {
        assert_eq!(resolve_ev_type("EV_KEY"), Some(1));
        assert_eq!(resolve_ev_type("ev_rel"), Some(2));
    }

    #[test]
    fn reverse_lookup_round_trips() {
        assert_eq!(key_name(30), "KEY_A");
        assert_eq!(rel_name(8), "REL_WHEEL");
    }
}
