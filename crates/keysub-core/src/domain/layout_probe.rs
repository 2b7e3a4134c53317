//! Keyboard layout probing.
//!
//! # What does the prober do?
//!
//! The engine must know which physical key produces the source character on
//! the *current* layout.  A Swedish keyboard produces `§` on the key left of
//! `1` (`VK_OEM_5`), a UK keyboard produces it with Shift+`3`, and a US
//! keyboard cannot produce it at all.  Rather than ship per-layout tables, the
//! prober asks the OS: for every VK code in [`PROBE_SCAN_RANGE`] it translates
//! the key once without modifiers and once with Shift held, and records which
//! codes yield exactly the source character.
//!
//! # Dead keys and the double call
//!
//! Layout translation on Windows is stateful.  When a key is a dead key
//! (an accent waiting to combine with the next letter), the first translation
//! primes the layout's internal dead-key buffer and reports the accent.  A
//! leftover dead key from an earlier call can also leak into the next
//! result.  Calling the primitive twice and trusting only the second result
//! flushes that state: [`resolve_character`] does exactly this, and both the
//! prober and the per-event verifier go through it so they always agree.
//!
//! # Fallback
//!
//! When the scan finds nothing (an exotic layout, or a translation API that
//! failed outright), [`detect`] returns [`CandidateKeySet::fallback`] instead
//! of an empty set.  Every keystroke on those OEM keys is then verified
//! live, which costs a little per keystroke but keeps the engine working.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::candidates::CandidateKeySet;
use super::diagnostics::{DiagnosticReport, ProbeMatch};
use crate::keymap::windows_vk::is_modifier;
use crate::keymap::PROBE_SCAN_RANGE;

/// Result of a single call to the OS layout-translation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// The key produces no character in this state.
    Nothing,
    /// The key is a dead key; the accent it will apply is reported.
    DeadKey(char),
    /// The key produces exactly one character.
    Char(char),
    /// The key produces several UTF-16 units (ligatures, flushed dead keys).
    Multiple(usize),
}

impl Translation {
    pub fn single_char(self) -> Option<char> {
        match self {
            Translation::Char(c) => Some(c),
            _ => None,
        }
    }
}

/// One call of the OS key-to-character translation facility.
///
/// Implementations perform exactly one translation per call and must not
/// hide the dead-key behaviour of the platform: [`resolve_character`]
/// relies on it.  Calls happen inside the hook callback, so they must not
/// block.
pub trait LayoutTranslator: Send + Sync {
    /// Translates `vk` against the active layout with Shift up or down and
    /// every other modifier released.
    fn translate(&self, vk: u8, shift: bool) -> Translation;
}

/// Translates `vk` twice and returns the character reported by the second
/// call, if it is a single character.
pub fn resolve_character(
    translator: &dyn LayoutTranslator,
    vk: u8,
    shift: bool,
) -> Option<char> {
    let _primed = translator.translate(vk, shift);
    translator.translate(vk, shift).single_char()
}

/// Characters produced by one VK code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducedChars {
    pub plain: Option<char>,
    pub shifted: Option<char>,
}

impl ProducedChars {
    pub fn produces(&self, c: char) -> bool {
        self.plain == Some(c) || self.shifted == Some(c)
    }
}

/// Snapshot of what the active layout produces across the scan range.
///
/// Built once by [`KeyboardLayoutProbe::scan`] and never mutated; a layout
/// change means a new scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardLayoutProbe {
    produced: BTreeMap<u8, ProducedChars>,
}

impl KeyboardLayoutProbe {
    /// Translates every VK code in [`PROBE_SCAN_RANGE`] (modifier keys
    /// excluded) under both shift states.
    pub fn scan(translator: &dyn LayoutTranslator) -> Self {
        let produced = PROBE_SCAN_RANGE
            .filter(|&vk| !is_modifier(vk))
            .filter_map(|vk| {
                let chars = ProducedChars {
                    plain: resolve_character(translator, vk, false),
                    shifted: resolve_character(translator, vk, true),
                };
                (chars != ProducedChars::default()).then_some((vk, chars))
            })
            .collect();
        Self { produced }
    }

    pub fn get(&self, vk: u8) -> Option<ProducedChars> {
        self.produced.get(&vk).copied()
    }

    /// VK codes producing `c` in either shift state, ascending.
    pub fn keys_producing(&self, c: char) -> impl Iterator<Item = (u8, ProducedChars)> + '_ {
        self.produced
            .iter()
            .filter(move |(_, chars)| chars.produces(c))
            .map(|(&vk, &chars)| (vk, chars))
    }

    /// Number of VK codes that produce any character at all.
    pub fn producing_key_count(&self) -> usize {
        self.produced.len()
    }
}

/// Probes the active layout for `source` and derives the candidate set.
///
/// Never returns an empty set: zero matches yields
/// [`CandidateKeySet::fallback`] and a report flagged accordingly.
pub fn detect(
    translator: &dyn LayoutTranslator,
    source: char,
) -> (CandidateKeySet, DiagnosticReport) {
    let probe = KeyboardLayoutProbe::scan(translator);
    let matches: Vec<ProbeMatch> = probe
        .keys_producing(source)
        .map(|(vk, chars)| ProbeMatch {
            vk_code: vk,
            plain: chars.plain,
            shifted: chars.shifted,
        })
        .collect();

    for m in &matches {
        debug!(
            "VK 0x{:02X} produces the source character (plain {:?}, shift {:?})",
            m.vk_code, m.plain, m.shifted
        );
    }

    let (candidates, used_fallback) = if matches.is_empty() {
        info!(
            source = ?source,
            "no key produces the source character on this layout; using OEM fallback keys"
        );
        (CandidateKeySet::fallback(), true)
    } else {
        (matches.iter().map(|m| m.vk_code).collect(), false)
    };

    let report = DiagnosticReport {
        source,
        scanned_keys: PROBE_SCAN_RANGE.filter(|&vk| !is_modifier(vk)).count(),
        producing_keys: probe.producing_key_count(),
        matches,
        used_fallback,
        candidates,
    };
    (candidates, report)
}
