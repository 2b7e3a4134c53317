//! Keyboard hook infrastructure.
//!
//! On Windows, this installs a low-level keyboard hook (`WH_KEYBOARD_LL`) on a
//! dedicated Win32 message-loop thread.  Every keyboard event on the system
//! is converted to a [`keysub_core::RawKeyEvent`] and handed synchronously
//! to the registered [`KeyEventSink`](crate::application::intercept_key::KeyEventSink),
//! whose [`HookDecision`](crate::application::intercept_key::HookDecision)
//! decides whether the event continues down the hook chain.
//!
//! # Windows-Specific Implementation
//!
//! The hook callback must complete within the system's
//! `LowLevelHooksTimeout` (a few hundred milliseconds) or Windows silently
//! removes the hook.  The sink therefore runs only bounded, non-blocking
//! work.
//!
//! # Testability
//!
//! [`mock::MockKeyboardHook`] implements the same
//! [`KeyboardHook`](crate::application::engine::KeyboardHook) trait and lets
//! tests fire events through the registered sink without OS hooks.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
