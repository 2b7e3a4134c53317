//! # keysub-core
//!
//! Shared library for KeySub, a system-wide single-key character
//! substitution engine.  It contains the keyboard-layout prober, the
//! candidate key filter, keyboard event types and the synthetic-input
//! marker.
//!
//! This crate has zero dependencies on OS APIs.  The interception engine and
//! its Windows adapters live in `keysub-engine`.
//!
//! # How a substitution works
//!
//! 1. At install time the **prober** translates every printable VK code
//!    against the active layout and collects the codes that produce the
//!    *source character* (by default `§`).  These become the
//!    **candidate set**.
//! 2. For every key-down the hook sees, the engine first checks the
//!    **synthetic-input marker** (its own replays are ignored), then
//!    candidate membership, then re-verifies the produced character live.
//! 3. A verified keystroke is suppressed and the *replacement character*
//!    (by default a backtick) is injected as Unicode input.
//!
//! - **`domain`** – event types, candidate set, prober, diagnostics.
//! - **`keymap`** – Windows VK constants and the probe/fallback ranges.

pub mod domain;
pub mod keymap;

pub use domain::candidates::{AtomicCandidateSet, CandidateKeySet};
pub use domain::diagnostics::{DiagnosticReport, ProbeMatch};
pub use domain::event::{
    unicode_keystrokes, InterceptedKeyEvent, KeyEventKind, ModifierState, RawKeyEvent,
    SyntheticKeystroke, SYNTHETIC_INPUT_MARKER,
};
pub use domain::layout_probe::{
    detect, resolve_character, KeyboardLayoutProbe, LayoutTranslator, ProducedChars, Translation,
};
pub use domain::target::{SubstitutionTarget, TargetError};
