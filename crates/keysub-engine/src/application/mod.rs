//! Application layer of the substitution engine.
//!
//! # What lives here?
//!
//! The application layer holds the decisions and the lifecycle, and talks to
//! the OS only through traits:
//!
//! - **`intercept_key`** – The per-keystroke decision logic
//!   ([`intercept_key::KeyInterceptor`]) plus the seams it uses: live
//!   modifier query, character injection, and the event-sink interface the
//!   hook calls into.  This runs on every key-down on the system.
//!
//! - **`engine`** – [`engine::InterceptionEngine`]: probes the layout,
//!   installs/uninstalls the hook idempotently, re-probes on request and
//!   renders diagnostics.
//!
//! - **`policy`** – The host-facing hook point: enable/disable and
//!   per-event replacement override.
//!
//! Nothing here makes OS calls, touches the file system or logs to a
//! particular sink; the `infrastructure` layer provides the Windows
//! implementations and test doubles.

pub mod engine;
pub mod intercept_key;
pub mod policy;
