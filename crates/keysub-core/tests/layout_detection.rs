//! Integration tests for layout detection across realistic keyboard layouts.
//!
//! Each test layout is a small table of what the real layout produces on the
//! keys relevant to the section sign; everything else translates to nothing.

use std::collections::HashMap;

use keysub_core::keymap::windows_vk::{VK_OEM_3, VK_OEM_5, VK_OEM_7};
use keysub_core::keymap::FALLBACK_OEM_KEYS;
use keysub_core::{detect, resolve_character, LayoutTranslator, Translation};

struct Layout {
    keys: HashMap<(u8, bool), Translation>,
}

impl Layout {
    fn new(entries: &[(u8, bool, Translation)]) -> Self {
        Self {
            keys: entries.iter().map(|&(vk, shift, t)| ((vk, shift), t)).collect(),
        }
    }

    /// Swedish: `§` / `½` left of `1`, dead acute/grave on OEM_4.
    fn swedish() -> Self {
        Self::new(&[
            (VK_OEM_5, false, Translation::Char('§')),
            (VK_OEM_5, true, Translation::Char('½')),
            (0xDB, false, Translation::Char('+')),
            (0xDB, true, Translation::Char('?')),
            (0xDD, false, Translation::DeadKey('´')),
            (0xDD, true, Translation::DeadKey('`')),
            (0x41, false, Translation::Char('a')),
            (0x41, true, Translation::Char('A')),
        ])
    }

    /// German: `§` is Shift+3, `^` dead key left of `1`.
    fn german() -> Self {
        Self::new(&[
            (0x33, false, Translation::Char('3')),
            (0x33, true, Translation::Char('§')),
            (0xDC, false, Translation::DeadKey('^')),
            (0xDC, true, Translation::Char('°')),
        ])
    }

    /// US: no section sign anywhere.
    fn us() -> Self {
        Self::new(&[
            (VK_OEM_3, false, Translation::Char('`')),
            (VK_OEM_3, true, Translation::Char('~')),
            (VK_OEM_7, false, Translation::Char('\'')),
            (VK_OEM_7, true, Translation::Char('"')),
        ])
    }
}

impl LayoutTranslator for Layout {
    fn translate(&self, vk: u8, shift: bool) -> Translation {
        self.keys
            .get(&(vk, shift))
            .copied()
            .unwrap_or(Translation::Nothing)
    }
}

#[test]
fn test_swedish_layout_detects_oem5_only() {
    let (candidates, report) = detect(&Layout::swedish(), '§');

    assert_eq!(candidates.iter().collect::<Vec<_>>(), vec![VK_OEM_5]);
    assert!(!report.used_fallback);
    // OEM_5, OEM_4 and A; the dead key on OEM_6 produces nothing.
    assert_eq!(report.producing_keys, 3);
}

#[test]
fn test_german_layout_detects_shifted_digit_three() {
    let (candidates, report) = detect(&Layout::german(), '§');

    assert_eq!(candidates.iter().collect::<Vec<_>>(), vec![0x33]);
    assert_eq!(report.matches[0].plain, Some('3'));
    assert_eq!(report.matches[0].shifted, Some('§'));
}

#[test]
fn test_us_layout_falls_back_to_oem_keys() {
    let (candidates, report) = detect(&Layout::us(), '§');

    assert_eq!(candidates.iter().collect::<Vec<_>>(), FALLBACK_OEM_KEYS.to_vec());
    assert!(report.used_fallback);
    assert!(report.to_string().contains("Fallback active"));
}

#[test]
fn test_dead_key_is_never_resolved_as_its_accent() {
    // The dead grave accent must not be mistaken for a typed backtick.
    assert_eq!(resolve_character(&Layout::swedish(), 0xDD, true), None);
}

#[test]
fn test_candidates_agree_with_live_verification() {
    let layout = Layout::german();
    let (candidates, _) = detect(&layout, '§');

    for vk in candidates.iter() {
        let plain = resolve_character(&layout, vk, false);
        let shifted = resolve_character(&layout, vk, true);
        assert!(
            plain == Some('§') || shifted == Some('§'),
            "candidate 0x{vk:02X} must verify live in some shift state"
        );
    }
}
