//! Synthetic character injection.
//!
//! The replacement character is typed as Unicode input rather than as a
//! virtual-key press, so it arrives verbatim regardless of the active layout
//! and never triggers dead-key composition.  Every emitted event is tagged
//! with [`keysub_core::SYNTHETIC_INPUT_MARKER`] so the hook can recognize
//! and skip its own output.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
