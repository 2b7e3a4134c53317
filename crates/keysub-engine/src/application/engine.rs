//! InterceptionEngine: lifecycle of the substitution hook.
//!
//! The engine owns one [`KeyboardHook`] and one [`KeyInterceptor`].
//!
//! ```text
//!                install()                      uninstall() / Drop
//!  Uninstalled ─────────────► probe layout ─► hook.install ─► Installed
//!       ▲                                                        │
//!       └────────────────────────────────────────────────────────┘
//! ```
//!
//! Both transitions are idempotent: installing while installed and
//! uninstalling while uninstalled are no-ops.  A rejected hook registration
//! is returned to the caller once; the engine never retries on its own.
//!
//! The host keeps its own `Arc` to the policy object to toggle substitution
//! while the engine is running.

use std::fmt::Write as _;
use std::sync::Arc;

use keysub_core::{detect, DiagnosticReport, LayoutTranslator, SubstitutionTarget};
use thiserror::Error;
use tracing::{debug, info};

use super::intercept_key::{
    CharacterInjector, KeyEventSink, KeyInterceptor, ModifierStateSource, StatsSnapshot,
};
use super::policy::ReplacementPolicy;

/// Error type for hook registration.
#[derive(Debug, Error)]
pub enum HookError {
    /// The OS rejected the hook (e.g. blocked by security policy).
    #[error("failed to install keyboard hook: {0}")]
    InstallFailed(String),
    #[error("failed to start hook thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
    #[error("hook thread exited before reporting its state")]
    ThreadLost,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Hook(#[from] HookError),
}

/// An OS keyboard hook that delivers events to a [`KeyEventSink`].
///
/// Implementations must keep the sink alive for exactly as long as the hook
/// is registered and must not release it while a callback is running.
pub trait KeyboardHook: Send {
    /// Registers the hook.  Returns once the OS has accepted or rejected it.
    fn install(&mut self, sink: Arc<dyn KeyEventSink>) -> Result<(), HookError>;
    /// Unregisters the hook and releases the sink.  A no-op if not installed.
    fn uninstall(&mut self);
    fn is_installed(&self) -> bool;
}

/// The OS-facing collaborators of an engine.
pub struct EngineParts {
    pub hook: Box<dyn KeyboardHook>,
    pub translator: Arc<dyn LayoutTranslator>,
    pub modifiers: Arc<dyn ModifierStateSource>,
    pub injector: Arc<dyn CharacterInjector>,
    pub policy: Arc<dyn ReplacementPolicy>,
}

/// The interception engine.
pub struct InterceptionEngine {
    hook: Box<dyn KeyboardHook>,
    interceptor: Arc<KeyInterceptor>,
    report: Option<DiagnosticReport>,
}

impl InterceptionEngine {
    pub fn new(target: SubstitutionTarget, parts: EngineParts) -> Self {
        let interceptor = KeyInterceptor::new(
            target,
            parts.translator,
            parts.modifiers,
            parts.injector,
            parts.policy,
        );
        Self {
            hook: parts.hook,
            interceptor: Arc::new(interceptor),
            report: None,
        }
    }

    /// Probes the layout and registers the hook.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Hook`] if the OS rejects the hook.  The engine
    /// stays uninstalled and may be installed again later.
    pub fn install(&mut self) -> Result<(), EngineError> {
        if self.hook.is_installed() {
            debug!("install() ignored: hook already installed");
            return Ok(());
        }

        self.refresh_layout();
        let sink: Arc<dyn KeyEventSink> = self.interceptor.clone();
        self.hook.install(sink)?;
        info!(
            source = ?self.interceptor.target().source(),
            replacement = ?self.interceptor.target().replacement(),
            candidates = self.interceptor.candidates().len(),
            "keyboard hook installed"
        );
        Ok(())
    }

    /// Unregisters the hook.  A no-op when not installed.
    pub fn uninstall(&mut self) {
        if !self.hook.is_installed() {
            return;
        }
        self.hook.uninstall();
        info!("keyboard hook uninstalled");
    }

    /// Releases all OS resources.  Safe to call repeatedly and from any state;
    /// `Drop` calls it too.
    pub fn dispose(&mut self) {
        self.uninstall();
    }

    pub fn is_installed(&self) -> bool {
        self.hook.is_installed()
    }

    /// Re-runs the layout probe and swaps in the new candidate set.
    ///
    /// Call this when the active input language changes; the engine does not
    /// watch for layout switches on its own.  Safe while installed.
    pub fn refresh_layout(&mut self) -> &DiagnosticReport {
        let (candidates, report) = detect(
            self.interceptor.translator(),
            self.interceptor.target().source(),
        );
        self.interceptor.set_candidates(candidates);
        debug!("layout probe:\n{report}");
        self.report.insert(report)
    }

    /// The report of the most recent probe, if any ran yet.
    pub fn last_report(&self) -> Option<&DiagnosticReport> {
        self.report.as_ref()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.interceptor.stats()
    }

    /// Troubleshooting text: install state, probe report and counters.
    pub fn diagnostic_info(&self) -> String {
        let mut text = String::new();
        let state = if self.is_installed() {
            "installed"
        } else {
            "not installed"
        };
        let _ = writeln!(text, "Hook: {state}");
        match &self.report {
            Some(report) => {
                let _ = writeln!(text, "{report}");
            }
            None => {
                let _ = writeln!(text, "Layout not probed yet.");
            }
        }
        let s = self.stats();
        let _ = write!(
            text,
            "Verified: {}  Replaced: {}  Declined: {}  Own events skipped: {}  \
             Injection failures: {}  Callback faults: {}",
            s.verified,
            s.replaced,
            s.declined,
            s.synthetic_skipped,
            s.injection_failures,
            s.callback_faults,
        );
        text
    }
}

impl Drop for InterceptionEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
