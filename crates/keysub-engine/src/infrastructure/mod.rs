//! Infrastructure layer of the substitution engine.
//!
//! Contains OS-facing adapters: the keyboard hook, character injection,
//! layout and modifier queries, configuration storage and logging setup.  Each adapter
//! directory has a `windows` implementation and a `mock` for tests.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keysub_core`, but MUST NOT be imported by the `application` or domain
//! layers outside of tests.

pub mod injection;
pub mod input_hook;
pub mod keyboard_layout;
pub mod logging;
pub mod platform;
pub mod storage;
