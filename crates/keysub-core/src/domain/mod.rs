//! Domain entities for KeySub.
//!
//! Pure logic with no OS dependencies.  Everything the hook callback needs
//! to decide about a keystroke (event types, the candidate set, the
//! double-translation rule) lives here and is tested on any platform; the OS
//! itself is reached only through the [`layout_probe::LayoutTranslator`]
//! trait.

pub mod candidates;
pub mod diagnostics;
pub mod event;
pub mod layout_probe;
pub mod target;
