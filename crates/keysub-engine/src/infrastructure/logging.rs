//! Logging setup for the host process.
//!
//! Log lines are handed to a background writer thread through
//! `tracing_appender::non_blocking`.  The keyboard hook thread emits warnings
//! on faults, and it must never wait on the console: a Windows console
//! stalls writers while the user has text selected in it.  When the writer
//! falls behind, lines are dropped instead.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` when set, otherwise `configured`.
pub fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter(configured))
}

/// Parses the configured level or directive, falling back to `info`.
pub fn configured_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber writing to stdout off-thread.
///
/// The returned guard flushes pending lines when dropped; keep it alive for
/// the lifetime of the process.
pub fn init_logging(configured: &str) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(configured))
        .with_writer(writer)
        .init();
    guard
}
