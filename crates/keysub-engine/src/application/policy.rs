//! Enable/replacement policy: the host's hook point into the engine.
//!
//! The engine offers every verified source-character keystroke to a
//! [`ReplacementPolicy`] as a mutable [`InterceptedKeyEvent`].  The policy can
//! let the replacement happen, cancel it, or change the replacement character
//! for that one event.  [`SubstitutionPolicy`] is the default: replace while
//! enabled, pass through while disabled.
//!
//! The enabled flag is written by the host (tray, console) and read on the
//! hook thread for every event, so it is an `AtomicBool`; a lock there could
//! stall the hook callback behind a UI thread.

use std::sync::atomic::{AtomicBool, Ordering};

use keysub_core::InterceptedKeyEvent;
use tracing::info;

/// Decides, per verified keystroke, whether and how it is replaced.
///
/// Called on the hook thread inside the OS callback: implementations must be
/// fast and must never block.
#[cfg_attr(test, mockall::automock)]
pub trait ReplacementPolicy: Send + Sync {
    fn on_intercepted(&self, event: &mut InterceptedKeyEvent);
}

/// Default policy: replace when enabled, never replace when disabled.
#[derive(Debug)]
pub struct SubstitutionPolicy {
    enabled: AtomicBool,
}

impl SubstitutionPolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            info!(enabled, "substitution toggled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flips the enabled flag and returns the new value.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::Relaxed);
        info!(enabled, "substitution toggled");
        enabled
    }
}

impl Default for SubstitutionPolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReplacementPolicy for SubstitutionPolicy {
    fn on_intercepted(&self, event: &mut InterceptedKeyEvent) {
        if !self.is_enabled() {
            event.should_replace = false;
        }
    }
}
