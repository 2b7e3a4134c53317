//! Candidate key set: the VK codes worth re-verifying on every keystroke.
//!
//! The set is checked inside the hook callback for every key-down on the
//! system, so membership must be O(1) and allocation-free.  It is stored as
//! a 256-bit bitmap (one bit per possible VK code).
//!
//! [`AtomicCandidateSet`] lets the control thread swap in a freshly probed
//! set while the hook thread keeps reading, without a lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::keymap::FALLBACK_OEM_KEYS;

const WORDS: usize = 4;

/// An immutable set of VK codes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CandidateKeySet {
    bits: [u64; WORDS],
}

impl CandidateKeySet {
    pub const fn empty() -> Self {
        Self { bits: [0; WORDS] }
    }

    /// The conservative superset used when probing finds no match.
    pub fn fallback() -> Self {
        FALLBACK_OEM_KEYS.into_iter().collect()
    }

    pub fn insert(&mut self, vk: u8) {
        let (word, mask) = locate(vk);
        self.bits[word] |= mask;
    }

    #[inline]
    pub fn contains(&self, vk: u8) -> bool {
        let (word, mask) = locate(vk);
        self.bits[word] & mask != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates the member VK codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&vk| self.contains(vk))
    }
}

impl FromIterator<u8> for CandidateKeySet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = Self::empty();
        for vk in iter {
            set.insert(vk);
        }
        set
    }
}

impl fmt::Debug for CandidateKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|vk| format!("0x{vk:02X}")))
            .finish()
    }
}

#[inline]
fn locate(vk: u8) -> (usize, u64) {
    ((vk >> 6) as usize, 1u64 << (vk & 0x3F))
}

/// A [`CandidateKeySet`] that can be replaced while being read concurrently.
///
/// A reader racing a [`store`](Self::store) may observe some words of the
/// old set and some of the new one; each VK lookup touches a single word,
/// so every individual answer comes from either the old or the new set.
#[derive(Default)]
pub struct AtomicCandidateSet {
    bits: [AtomicU64; WORDS],
}

impl AtomicCandidateSet {
    pub fn new(set: CandidateKeySet) -> Self {
        let atomic = Self::default();
        atomic.store(set);
        atomic
    }

    pub fn store(&self, set: CandidateKeySet) {
        for (slot, word) in self.bits.iter().zip(set.bits) {
            slot.store(word, Ordering::Release);
        }
    }

    pub fn load(&self) -> CandidateKeySet {
        let mut set = CandidateKeySet::empty();
        for (word, slot) in set.bits.iter_mut().zip(&self.bits) {
            *word = slot.load(Ordering::Acquire);
        }
        set
    }

    #[inline]
    pub fn contains(&self, vk: u8) -> bool {
        let (word, mask) = locate(vk);
        self.bits[word].load(Ordering::Acquire) & mask != 0
    }
}

impl fmt::Debug for AtomicCandidateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.load().fmt(f)
    }
}
