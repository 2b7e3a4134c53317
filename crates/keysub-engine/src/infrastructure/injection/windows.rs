//! Windows character injection via the SendInput API.
//!
//! A character is typed as `KEYEVENTF_UNICODE` events: `wVk` is zero and
//! `wScan` carries one UTF-16 unit, so the target application receives the
//! character verbatim whatever the active layout is.  All down/up events of
//! one character are submitted in a single `SendInput` call so no physical
//! keystroke can be interleaved with them.

#![cfg(target_os = "windows")]

use keysub_core::{unicode_keystrokes, SyntheticKeystroke};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

use crate::application::intercept_key::{CharacterInjector, InjectionError};

/// Windows implementation of [`CharacterInjector`] using SendInput.
pub struct WindowsCharacterInjector;

impl WindowsCharacterInjector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsCharacterInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterInjector for WindowsCharacterInjector {
    fn inject_character(&self, c: char) -> Result<(), InjectionError> {
        let inputs: Vec<INPUT> = unicode_keystrokes(c).iter().map(to_input).collect();
        let requested = inputs.len() as u32;

        // SAFETY: `inputs` is a valid slice of keyboard INPUT structures and
        // cbSize is the size of one element.
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };

        if sent == requested {
            Ok(())
        } else {
            Err(InjectionError::Incomplete { sent, requested })
        }
    }
}

fn to_input(stroke: &SyntheticKeystroke) -> INPUT {
    let mut flags: KEYBD_EVENT_FLAGS = KEYEVENTF_UNICODE;
    if stroke.key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: stroke.utf16_unit,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: stroke.extra_info,
            },
        },
    }
}
