//! Scripted layout and modifier sources for tests.
//!
//! [`MockLayoutTranslator`] behaves like the Windows translation primitive,
//! including its dead-key state: translating a dead key arms a pending
//! accent, and the next translation flushes it as two UTF-16 units.  That is
//! the behaviour the double translation in the probe exists to absorb.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use keysub_core::{LayoutTranslator, ModifierState, Translation};

use crate::application::intercept_key::ModifierStateSource;

#[derive(Debug, Clone, Copy)]
enum KeyBehaviour {
    Produces {
        plain: Option<char>,
        shifted: Option<char>,
    },
    Dead(char),
}

#[derive(Default)]
struct LayoutTable {
    keys: BTreeMap<u8, KeyBehaviour>,
    pending_dead_key: bool,
}

/// Table-driven [`LayoutTranslator`].  Clones share one table, so a test can
/// switch the "active layout" while the engine holds the translator.
#[derive(Clone, Default)]
pub struct MockLayoutTranslator {
    table: Arc<Mutex<LayoutTable>>,
    calls: Arc<AtomicUsize>,
}

impl MockLayoutTranslator {
    /// A layout on which no key produces a character.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(self, vk: u8, plain: char, shifted: char) -> Self {
        self.set_key(vk, Some(plain), Some(shifted));
        self
    }

    pub fn with_dead_key(self, vk: u8, accent: char) -> Self {
        self.lock().keys.insert(vk, KeyBehaviour::Dead(accent));
        self
    }

    pub fn set_key(&self, vk: u8, plain: Option<char>, shifted: Option<char>) {
        self.lock()
            .keys
            .insert(vk, KeyBehaviour::Produces { plain, shifted });
    }

    /// Removes every key, e.g. to simulate switching to an empty layout.
    pub fn clear(&self) {
        let mut table = self.lock();
        table.keys.clear();
        table.pending_dead_key = false;
    }

    /// Number of translations performed so far.
    pub fn translate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, LayoutTable> {
        self.table.lock().expect("lock poisoned")
    }
}

impl LayoutTranslator for MockLayoutTranslator {
    fn translate(&self, vk: u8, shift: bool) -> Translation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut table = self.lock();
        let flushed = std::mem::take(&mut table.pending_dead_key);

        match table.keys.get(&vk).copied() {
            Some(KeyBehaviour::Dead(accent)) => {
                if flushed {
                    Translation::Multiple(2)
                } else {
                    table.pending_dead_key = true;
                    Translation::DeadKey(accent)
                }
            }
            Some(KeyBehaviour::Produces { plain, shifted }) => {
                match (if shift { shifted } else { plain }, flushed) {
                    (Some(_), true) => Translation::Multiple(2),
                    (Some(c), false) => Translation::Char(c),
                    (None, _) => Translation::Nothing,
                }
            }
            None => Translation::Nothing,
        }
    }
}

/// Settable [`ModifierStateSource`].  Clones share the state.
#[derive(Clone, Default)]
pub struct MockModifierState {
    shift: Arc<AtomicBool>,
    ctrl: Arc<AtomicBool>,
    alt: Arc<AtomicBool>,
}

impl MockModifierState {
    /// No modifier held.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, state: ModifierState) {
        self.shift.store(state.shift, Ordering::SeqCst);
        self.ctrl.store(state.ctrl, Ordering::SeqCst);
        self.alt.store(state.alt, Ordering::SeqCst);
    }
}

impl ModifierStateSource for MockModifierState {
    fn current(&self) -> ModifierState {
        ModifierState {
            shift: self.shift.load(Ordering::SeqCst),
            ctrl: self.ctrl.load(Ordering::SeqCst),
            alt: self.alt.load(Ordering::SeqCst),
        }
    }
}
