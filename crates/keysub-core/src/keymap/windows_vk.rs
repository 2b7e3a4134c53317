//! Windows Virtual Key (VK) code constants and ranges used by the prober.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//! Windows VK codes range from 0x00 to 0xFF.
//!
//! # Which keys matter here?
//!
//! The source character of a substitution is always produced by a printable
//! key: a letter, a digit, a numpad key, or one of the "OEM" punctuation keys
//! whose meaning changes from layout to layout (`VK_OEM_1` … `VK_OEM_8`,
//! `VK_OEM_102`).  The prober therefore scans [`PROBE_SCAN_RANGE`], which
//! starts at `VK_SPACE` and covers every printable and OEM code, and falls
//! back to [`FALLBACK_OEM_KEYS`] when the scan finds nothing.
//!
//! Names are kept in a compile-time table indexed by VK code, so looking one
//! up for a diagnostic line is an O(1) array access.

use std::ops::RangeInclusive;

pub const VK_SHIFT: u8 = 0x10;
pub const VK_CONTROL: u8 = 0x11;
/// `VK_MENU` is the Alt key.
pub const VK_MENU: u8 = 0x12;
pub const VK_SPACE: u8 = 0x20;

pub const VK_OEM_1: u8 = 0xBA;
pub const VK_OEM_PLUS: u8 = 0xBB;
pub const VK_OEM_COMMA: u8 = 0xBC;
pub const VK_OEM_MINUS: u8 = 0xBD;
pub const VK_OEM_PERIOD: u8 = 0xBE;
pub const VK_OEM_2: u8 = 0xBF;
/// The key left of `1` on a US layout (backquote / tilde).
pub const VK_OEM_3: u8 = 0xC0;
pub const VK_OEM_4: u8 = 0xDB;
pub const VK_OEM_5: u8 = 0xDC;
pub const VK_OEM_6: u8 = 0xDD;
pub const VK_OEM_7: u8 = 0xDE;
pub const VK_OEM_8: u8 = 0xDF;
/// The extra key between left Shift and `Z` on ISO keyboards.
pub const VK_OEM_102: u8 = 0xE2;
/// VK reported for events injected with `KEYEVENTF_UNICODE`.
pub const VK_PACKET: u8 = 0xE7;

/// VK codes tested against the live layout during probing.
pub const PROBE_SCAN_RANGE: RangeInclusive<u8> = VK_SPACE..=0xFE;

/// OEM-class keys assumed to be candidates when probing finds no match.
///
/// These are the keys whose produced character is layout-dependent, so on an
/// unknown layout they are the only plausible home of a punctuation-like
/// source character.
pub const FALLBACK_OEM_KEYS: [u8; 13] = [
    VK_OEM_1,
    VK_OEM_PLUS,
    VK_OEM_COMMA,
    VK_OEM_MINUS,
    VK_OEM_PERIOD,
    VK_OEM_2,
    VK_OEM_3,
    VK_OEM_4,
    VK_OEM_5,
    VK_OEM_6,
    VK_OEM_7,
    VK_OEM_8,
    VK_OEM_102,
];

/// Returns the `winuser.h` name of a VK code, or `None` for codes this
/// crate never reports.
pub fn vk_name(vk: u8) -> Option<&'static str> {
    VK_NAME_TABLE[vk as usize]
}

/// Returns `true` for the generic and sided Shift / Ctrl / Alt VK codes.
pub fn is_modifier(vk: u8) -> bool {
    matches!(vk, VK_SHIFT | VK_CONTROL | VK_MENU | 0xA0..=0xA5)
}

/// VK → name table indexed by VK code (0x00–0xFF).
const VK_NAME_TABLE: [Option<&'static str>; 256] = {
    let mut t: [Option<&'static str>; 256] = [None; 256];

    t[VK_SHIFT as usize] = Some("VK_SHIFT");
    t[VK_CONTROL as usize] = Some("VK_CONTROL");
    t[VK_MENU as usize] = Some("VK_MENU");
    t[VK_SPACE as usize] = Some("VK_SPACE");

    // ── Digits and letters share their ASCII codes ────────────────────────────
    let digits = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
    let mut i = 0;
    while i < digits.len() {
        t[0x30 + i] = Some(digits[i]);
        i += 1;
    }
    let letters = [
        "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
        "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    ];
    let mut i = 0;
    while i < letters.len() {
        t[0x41 + i] = Some(letters[i]);
        i += 1;
    }

    // ── Numpad ────────────────────────────────────────────────────────────────
    let numpad = [
        "VK_NUMPAD0", "VK_NUMPAD1", "VK_NUMPAD2", "VK_NUMPAD3", "VK_NUMPAD4",
        "VK_NUMPAD5", "VK_NUMPAD6", "VK_NUMPAD7", "VK_NUMPAD8", "VK_NUMPAD9",
        "VK_MULTIPLY", "VK_ADD", "VK_SEPARATOR", "VK_SUBTRACT", "VK_DECIMAL", "VK_DIVIDE",
    ];
    let mut i = 0;
    while i < numpad.len() {
        t[0x60 + i] = Some(numpad[i]);
        i += 1;
    }

    // ── Sided modifiers ───────────────────────────────────────────────────────
    t[0xA0] = Some("VK_LSHIFT");
    t[0xA1] = Some("VK_RSHIFT");
    t[0xA2] = Some("VK_LCONTROL");
    t[0xA3] = Some("VK_RCONTROL");
    t[0xA4] = Some("VK_LMENU");
    t[0xA5] = Some("VK_RMENU");

    // ── OEM keys ──────────────────────────────────────────────────────────────
    t[VK_OEM_1 as usize] = Some("VK_OEM_1");
    t[VK_OEM_PLUS as usize] = Some("VK_OEM_PLUS");
    t[VK_OEM_COMMA as usize] = Some("VK_OEM_COMMA");
    t[VK_OEM_MINUS as usize] = Some("VK_OEM_MINUS");
    t[VK_OEM_PERIOD as usize] = Some("VK_OEM_PERIOD");
    t[VK_OEM_2 as usize] = Some("VK_OEM_2");
    t[VK_OEM_3 as usize] = Some("VK_OEM_3");
    t[VK_OEM_4 as usize] = Some("VK_OEM_4");
    t[VK_OEM_5 as usize] = Some("VK_OEM_5");
    t[VK_OEM_6 as usize] = Some("VK_OEM_6");
    t[VK_OEM_7 as usize] = Some("VK_OEM_7");
    t[VK_OEM_8 as usize] = Some("VK_OEM_8");
    t[VK_OEM_102 as usize] = Some("VK_OEM_102");
    t[VK_PACKET as usize] = Some("VK_PACKET");

    t
};
