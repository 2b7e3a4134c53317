//! Keyboard layout and modifier queries.
//!
//! - [`LayoutTranslator`](keysub_core::LayoutTranslator) implementations
//!   translate a VK code to the character it produces on the layout of the
//!   foreground window.
//! - [`ModifierStateSource`](crate::application::intercept_key::ModifierStateSource)
//!   implementations report which modifiers are physically held right now.
//!
//! Both are called from the hook callback and must not block.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
