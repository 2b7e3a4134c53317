//! Mock keyboard hook for unit testing.
//!
//! Stands in for the Windows hook thread: `install` stores the sink,
//! [`MockKeyboardHook::fire`] delivers an event to it the way the OS callback
//! would, and counters record how often the hook was registered.
//!
//! The mock is `Clone` and all clones share state, so a test can hand one
//! clone to the engine (which takes ownership) and keep another to drive and
//! inspect it.

use std::sync::{Arc, Mutex, MutexGuard};

use keysub_core::RawKeyEvent;

use crate::application::engine::{HookError, KeyboardHook};
use crate::application::intercept_key::{HookDecision, KeyEventSink};

#[derive(Default)]
struct HookState {
    sink: Option<Arc<dyn KeyEventSink>>,
    install_count: u32,
    uninstall_count: u32,
    reject_next: Option<String>,
}

/// A mock implementation of [`KeyboardHook`].
#[derive(Clone, Default)]
pub struct MockKeyboardHook {
    state: Arc<Mutex<HookState>>,
}

impl MockKeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `install` fail as if the OS rejected the hook.
    pub fn reject_next_install(&self, reason: &str) {
        self.lock().reject_next = Some(reason.to_string());
    }

    /// Delivers `event` to the registered sink.
    ///
    /// Returns `None` when no hook is installed: the event would never have
    /// reached KeySub.
    pub fn fire(&self, event: &RawKeyEvent) -> Option<HookDecision> {
        // Clone the sink out so the lock is not held during the callback.
        let sink = self.lock().sink.clone()?;
        Some(sink.on_key_event(event))
    }

    /// Number of successful installs.
    pub fn install_count(&self) -> u32 {
        self.lock().install_count
    }

    pub fn uninstall_count(&self) -> u32 {
        self.lock().uninstall_count
    }

    pub fn has_sink(&self) -> bool {
        self.lock().sink.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HookState> {
        self.state.lock().expect("lock poisoned")
    }
}

impl KeyboardHook for MockKeyboardHook {
    fn install(&mut self, sink: Arc<dyn KeyEventSink>) -> Result<(), HookError> {
        let mut state = self.lock();
        if let Some(reason) = state.reject_next.take() {
            return Err(HookError::InstallFailed(reason));
        }
        if state.sink.is_none() {
            state.sink = Some(sink);
            state.install_count += 1;
        }
        Ok(())
    }

    fn uninstall(&mut self) {
        let mut state = self.lock();
        if state.sink.take().is_some() {
            state.uninstall_count += 1;
        }
    }

    fn is_installed(&self) -> bool {
        self.has_sink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SuppressAll;

    impl KeyEventSink for SuppressAll {
        fn on_key_event(&self, _event: &RawKeyEvent) -> HookDecision {
            HookDecision::Suppress
        }
    }

    #[test]
    fn test_fire_before_install_returns_none() {
        let hook = MockKeyboardHook::new();
        assert_eq!(hook.fire(&RawKeyEvent::key_down(0x41)), None);
    }

    #[test]
    fn test_fire_after_install_reaches_sink() {
        // Arrange
        let mut hook = MockKeyboardHook::new();
        hook.install(Arc::new(SuppressAll)).expect("install");

        // Act
        let decision = hook.fire(&RawKeyEvent::key_down(0x41));

        // Assert
        assert_eq!(decision, Some(HookDecision::Suppress));
    }

    #[test]
    fn test_clones_share_state() {
        let observer = MockKeyboardHook::new();
        let mut owner = observer.clone();

        owner.install(Arc::new(SuppressAll)).expect("install");

        assert!(observer.is_installed());
        assert_eq!(observer.install_count(), 1);
    }

    #[test]
    fn test_rejection_applies_to_one_install_only() {
        let mut hook = MockKeyboardHook::new();
        hook.reject_next_install("blocked by policy");

        assert!(matches!(
            hook.install(Arc::new(SuppressAll)),
            Err(HookError::InstallFailed(_))
        ));
        assert!(hook.install(Arc::new(SuppressAll)).is_ok());
    }

    #[test]
    fn test_uninstall_releases_sink() {
        let mut hook = MockKeyboardHook::new();
        hook.install(Arc::new(SuppressAll)).expect("install");

        hook.uninstall();
        hook.uninstall();

        assert!(!hook.has_sink());
        assert_eq!(hook.uninstall_count(), 1);
        assert_eq!(hook.fire(&RawKeyEvent::key_down(0x41)), None);
    }
}
