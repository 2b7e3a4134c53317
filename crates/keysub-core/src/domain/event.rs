//! Keyboard event types shared by the hook, the interceptor and the policy.

use crate::keymap::windows_vk::VK_PACKET;

/// Sentinel stamped in the extra-data field of every event KeySub injects.
///
/// The hook compares each incoming event's extra-data tag against this value
/// to tell the engine's own replay apart from organic keystrokes.
pub const SYNTHETIC_INPUT_MARKER: usize = 0x4B53_5542;

/// Whether a raw event is a press or a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
}

/// A keyboard event as delivered by the OS low-level hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// Windows Virtual Key code.
    pub vk_code: u8,
    /// Hardware scan code (or UTF-16 unit for `VK_PACKET` events).
    pub scan_code: u16,
    pub kind: KeyEventKind,
    /// Milliseconds since system start.
    pub time_ms: u32,
    /// The extra-data tag attached by whoever produced the event.
    pub extra_info: usize,
    /// `true` if the OS flagged the event as injected by some process.
    pub is_injected: bool,
}

impl RawKeyEvent {
    /// Builds an organic key-down for `vk_code`.
    pub fn key_down(vk_code: u8) -> Self {
        Self {
            vk_code,
            scan_code: 0,
            kind: KeyEventKind::KeyDown,
            time_ms: 0,
            extra_info: 0,
            is_injected: false,
        }
    }

    /// Builds an organic key-up for `vk_code`.
    pub fn key_up(vk_code: u8) -> Self {
        Self {
            kind: KeyEventKind::KeyUp,
            ..Self::key_down(vk_code)
        }
    }

    /// Returns `true` if this event was injected by KeySub itself.
    ///
    /// Only the marker counts: other software may inject input too, and
    /// those events are treated like real keystrokes.
    pub fn carries_marker(&self) -> bool {
        self.extra_info == SYNTHETIC_INPUT_MARKER
    }

    pub fn is_key_down(&self) -> bool {
        self.kind == KeyEventKind::KeyDown
    }
}

/// Live state of the modifiers that influence character production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierState {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// Returns `true` when ctrl or alt is held, i.e. the keystroke is an
    /// application shortcut rather than text input.  AltGr reports as both.
    pub fn is_shortcut(&self) -> bool {
        self.ctrl || self.alt
    }
}

/// A verified source-character keystroke offered to the policy layer.
///
/// The policy may clear [`should_replace`](Self::should_replace) to let the
/// original keystroke through, or swap the [`replacement`](Self::replacement)
/// for this one event.  The value lives only for the duration of one hook
/// callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedKeyEvent {
    vk_code: u8,
    pub should_replace: bool,
    pub replacement: char,
}

impl InterceptedKeyEvent {
    pub fn new(vk_code: u8, replacement: char) -> Self {
        Self {
            vk_code,
            should_replace: true,
            replacement,
        }
    }

    pub fn vk_code(&self) -> u8 {
        self.vk_code
    }
}

/// One descriptor of a synthetic Unicode keystroke.
///
/// Maps 1:1 onto a `KEYBDINPUT` with `KEYEVENTF_UNICODE`: `wVk` is zero,
/// `wScan` carries the UTF-16 unit and `dwExtraInfo` carries the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticKeystroke {
    pub utf16_unit: u16,
    pub key_up: bool,
    pub extra_info: usize,
}

impl SyntheticKeystroke {
    /// The event the hook will observe when this keystroke is replayed.
    pub fn as_observed(&self) -> RawKeyEvent {
        RawKeyEvent {
            vk_code: VK_PACKET,
            scan_code: self.utf16_unit,
            kind: if self.key_up {
                KeyEventKind::KeyUp
            } else {
                KeyEventKind::KeyDown
            },
            time_ms: 0,
            extra_info: self.extra_info,
            is_injected: true,
        }
    }
}

/// Builds the marker-stamped down/up sequence that types `c`.
///
/// Characters outside the Basic Multilingual Plane become a surrogate pair;
/// each unit gets its own down/up pair.
pub fn unicode_keystrokes(c: char) -> Vec<SyntheticKeystroke> {
    let mut units = [0u16; 2];
    c.encode_utf16(&mut units)
        .iter()
        .flat_map(|&unit| {
            [false, true].map(|key_up| SyntheticKeystroke {
                utf16_unit: unit,
                key_up,
                extra_info: SYNTHETIC_INPUT_MARKER,
            })
        })
        .collect()
}
