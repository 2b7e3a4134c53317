//! Windows layout translation and modifier state.
//!
//! Translation goes through `ToUnicodeEx` against the keyboard layout of the
//! thread that owns the foreground window: keyboard layouts are per-thread
//! on Windows, and the user types into the foreground application, not into
//! KeySub.  `ToUnicodeEx` shares dead-key state with the layout, which is
//! why callers go through [`keysub_core::resolve_character`].

#![cfg(target_os = "windows")]

use keysub_core::keymap::windows_vk::{VK_CONTROL, VK_MENU, VK_SHIFT};
use keysub_core::{LayoutTranslator, ModifierState, Translation};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyboardLayout, MapVirtualKeyExW, ToUnicodeEx, MAPVK_VK_TO_VSC,
};
use windows::Win32::UI::TextServices::HKL;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

use crate::application::intercept_key::ModifierStateSource;

/// High bit of a key-state byte: the key is down.
const KEY_DOWN: u8 = 0x80;

/// Windows implementation of [`LayoutTranslator`] using `ToUnicodeEx`.
pub struct WindowsLayoutTranslator;

impl WindowsLayoutTranslator {
    pub fn new() -> Self {
        Self
    }

    fn active_layout() -> HKL {
        // SAFETY: GetForegroundWindow may return a null HWND, for which
        // GetWindowThreadProcessId returns 0 and GetKeyboardLayout(0) yields
        // the layout of the calling thread.
        unsafe {
            let thread = GetWindowThreadProcessId(GetForegroundWindow(), None);
            GetKeyboardLayout(thread)
        }
    }
}

impl Default for WindowsLayoutTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTranslator for WindowsLayoutTranslator {
    fn translate(&self, vk: u8, shift: bool) -> Translation {
        let layout = Self::active_layout();

        let mut key_state = [0u8; 256];
        if shift {
            key_state[VK_SHIFT as usize] = KEY_DOWN;
        }
        let mut buffer = [0u16; 8];

        // SAFETY: key_state and buffer are valid stack buffers of the sizes
        // ToUnicodeEx expects; `layout` was just returned by the OS.
        let count = unsafe {
            let scan = MapVirtualKeyExW(vk as u32, MAPVK_VK_TO_VSC, Some(layout));
            ToUnicodeEx(vk as u32, scan, &key_state, &mut buffer, 0, Some(layout))
        };

        decode(count, &buffer)
    }
}

/// Interprets a `ToUnicodeEx` return value and output buffer.
fn decode(count: i32, buffer: &[u16]) -> Translation {
    match count {
        0 => Translation::Nothing,
        n if n < 0 => char::decode_utf16(buffer[..1].iter().copied())
            .next()
            .and_then(Result::ok)
            .map_or(Translation::Nothing, Translation::DeadKey),
        n => {
            let units = &buffer[..(n as usize).min(buffer.len())];
            let mut chars = char::decode_utf16(units.iter().copied());
            match (chars.next(), chars.next()) {
                (Some(Ok(c)), None) => Translation::Char(c),
                _ => Translation::Multiple(units.len()),
            }
        }
    }
}

/// Windows implementation of [`ModifierStateSource`] using `GetAsyncKeyState`.
///
/// Queries the physical state at call time; the state recorded in the hook
/// event can lag behind when modifiers change rapidly.
pub struct WindowsModifierState;

impl WindowsModifierState {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsModifierState {
    fn default() -> Self {
        Self::new()
    }
}

fn is_down(vk: u8) -> bool {
    // SAFETY: GetAsyncKeyState has no preconditions.
    let state = unsafe { GetAsyncKeyState(vk as i32) };
    (state as u16) & 0x8000 != 0
}

impl ModifierStateSource for WindowsModifierState {
    fn current(&self) -> ModifierState {
        ModifierState {
            shift: is_down(VK_SHIFT),
            ctrl: is_down(VK_CONTROL),
            alt: is_down(VK_MENU),
        }
    }
}
