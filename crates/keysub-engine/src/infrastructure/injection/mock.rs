//! Recording injector for unit and integration tests.
//!
//! Instead of calling `SendInput`, [`RecordingInjector`] records the
//! characters it was asked to type and the exact keystroke sequence the
//! Windows injector would have submitted.  Tests replay that sequence
//! through the hook to check that KeySub ignores its own output.

use std::sync::{Arc, Mutex, MutexGuard};

use keysub_core::{unicode_keystrokes, SyntheticKeystroke};

use crate::application::intercept_key::{CharacterInjector, InjectionError};

#[derive(Default)]
struct Recorded {
    chars: Vec<char>,
    keystrokes: Vec<SyntheticKeystroke>,
    failure: Option<InjectionError>,
}

/// A [`CharacterInjector`] that records instead of injecting.
///
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingInjector {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `error`.  Nothing is recorded
    /// for failed calls.
    pub fn fail_with(&self, error: InjectionError) {
        self.lock().failure = Some(error);
    }

    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    /// Characters injected so far, in order.
    pub fn injected(&self) -> Vec<char> {
        self.lock().chars.clone()
    }

    /// Keystrokes that would have been handed to the OS, in order.
    pub fn keystrokes(&self) -> Vec<SyntheticKeystroke> {
        self.lock().keystrokes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().expect("lock poisoned")
    }
}

impl CharacterInjector for RecordingInjector {
    fn inject_character(&self, c: char) -> Result<(), InjectionError> {
        let mut recorded = self.lock();
        if let Some(error) = &recorded.failure {
            return Err(error.clone());
        }
        recorded.chars.push(c);
        recorded.keystrokes.extend(unicode_keystrokes(c));
        Ok(())
    }
}
