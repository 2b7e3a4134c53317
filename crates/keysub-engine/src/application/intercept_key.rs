//! KeyInterceptor: the per-keystroke decision logic of the engine.
//!
//! The interceptor is the [`KeyEventSink`] registered with the OS hook.  For
//! every keyboard event on the system it decides whether to let the event
//! through or to suppress it and type the replacement character instead.
//!
//! # Architecture
//!
//! The interceptor depends only on traits (`LayoutTranslator`,
//! `ModifierStateSource`, `CharacterInjector`, `ReplacementPolicy`).  The
//! Windows implementations are injected at construction time, so the whole
//! decision path is unit-testable without a live hook.
//!
//! # Hook context rules
//!
//! [`KeyEventSink::on_key_event`] runs inside the OS low-level hook callback.
//! Windows silently removes hooks whose callback is slow, and a panic that
//! unwinds into the OS would abort the process.  Therefore:
//!
//! - every step is O(1) or bounded by a handful of OS calls, and nothing
//!   blocks;
//! - errors and panics are caught here, counted, and turned into
//!   [`HookDecision::PassThrough`] so the user's keystroke is never lost.
//! - outcomes are recorded in [`EngineStats`] counters.  Only faults are
//!   logged, and the host installs a non-blocking log writer, so the
//!   callback never waits on console or file output.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use keysub_core::{
    resolve_character, AtomicCandidateSet, CandidateKeySet, InterceptedKeyEvent,
    LayoutTranslator, ModifierState, RawKeyEvent, SubstitutionTarget,
};
use thiserror::Error;
use tracing::warn;

use super::policy::ReplacementPolicy;

/// What the hook should do with the event it is currently delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Hand the event to the next hook in the chain unchanged.
    PassThrough,
    /// Consume the event; no other component on the system sees it.
    Suppress,
}

/// Receiver of raw keyboard events from an OS hook.
pub trait KeyEventSink: Send + Sync {
    fn on_key_event(&self, event: &RawKeyEvent) -> HookDecision;
}

/// Live modifier-key query.
///
/// The low-level event does not carry reliable modifier context, so the
/// interceptor asks the OS for the physical key state at decision time.
#[cfg_attr(test, mockall::automock)]
pub trait ModifierStateSource: Send + Sync {
    fn current(&self) -> ModifierState;
}

/// Error type for synthetic input injection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InjectionError {
    /// The OS accepted fewer events than were submitted.
    #[error("injected {sent} of {requested} synthetic events")]
    Incomplete { sent: u32, requested: u32 },
}

impl InjectionError {
    /// Returns `true` when part of the keystroke reached the OS, so the
    /// original event can no longer be passed through cleanly.
    pub fn partially_delivered(&self) -> bool {
        matches!(self, InjectionError::Incomplete { sent, .. } if *sent > 0)
    }
}

/// Types a literal character by synthetic Unicode input.
///
/// Every emitted event must carry [`keysub_core::SYNTHETIC_INPUT_MARKER`].
/// Called from inside the hook callback: no blocking, no re-entrancy on the
/// hook.
#[cfg_attr(test, mockall::automock)]
pub trait CharacterInjector: Send + Sync {
    fn inject_character(&self, c: char) -> Result<(), InjectionError>;
}

/// Error raised inside the per-event path.  Never leaves the hook callback.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("injection failed: {0}")]
    Injection(#[from] InjectionError),
}

/// Counters for diagnostics, updated on the hook thread.
#[derive(Debug, Default)]
pub struct EngineStats {
    verified: AtomicU64,
    replaced: AtomicU64,
    declined: AtomicU64,
    synthetic_skipped: AtomicU64,
    injection_failures: AtomicU64,
    callback_faults: AtomicU64,
}

/// A point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Key-downs that verified as the source character.
    pub verified: u64,
    /// Verified keystrokes that were suppressed and replaced.
    pub replaced: u64,
    /// Verified keystrokes the policy let through.
    pub declined: u64,
    /// Events ignored because they carried the synthetic marker.
    pub synthetic_skipped: u64,
    pub injection_failures: u64,
    /// Errors or panics contained inside the callback.
    pub callback_faults: u64,
}

impl EngineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            verified: self.verified.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            declined: self.declined.load(Ordering::Relaxed),
            synthetic_skipped: self.synthetic_skipped.load(Ordering::Relaxed),
            injection_failures: self.injection_failures.load(Ordering::Relaxed),
            callback_faults: self.callback_faults.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// The per-event decision logic, shared between the engine and the hook thread.
pub struct KeyInterceptor {
    target: SubstitutionTarget,
    candidates: AtomicCandidateSet,
    translator: Arc<dyn LayoutTranslator>,
    modifiers: Arc<dyn ModifierStateSource>,
    injector: Arc<dyn CharacterInjector>,
    policy: Arc<dyn ReplacementPolicy>,
    stats: EngineStats,
}

impl KeyInterceptor {
    /// Creates an interceptor with an empty candidate set; nothing is
    /// intercepted until [`set_candidates`](Self::set_candidates) is called.
    pub fn new(
        target: SubstitutionTarget,
        translator: Arc<dyn LayoutTranslator>,
        modifiers: Arc<dyn ModifierStateSource>,
        injector: Arc<dyn CharacterInjector>,
        policy: Arc<dyn ReplacementPolicy>,
    ) -> Self {
        Self {
            target,
            candidates: AtomicCandidateSet::default(),
            translator,
            modifiers,
            injector,
            policy,
            stats: EngineStats::default(),
        }
    }

    pub fn target(&self) -> SubstitutionTarget {
        self.target
    }

    /// Replaces the candidate set; safe while the hook is delivering events.
    pub fn set_candidates(&self, candidates: CandidateKeySet) {
        self.candidates.store(candidates);
    }

    pub fn candidates(&self) -> CandidateKeySet {
        self.candidates.load()
    }

    pub fn translator(&self) -> &dyn LayoutTranslator {
        self.translator.as_ref()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn process(&self, event: &RawKeyEvent) -> Result<HookDecision, InterceptError> {
        if event.carries_marker() {
            EngineStats::bump(&self.stats.synthetic_skipped);
            return Ok(HookDecision::PassThrough);
        }
        if !event.is_key_down() || !self.candidates.contains(event.vk_code) {
            return Ok(HookDecision::PassThrough);
        }

        let modifiers = self.modifiers.current();
        if modifiers.is_shortcut() {
            return Ok(HookDecision::PassThrough);
        }

        // The candidate set is layout-level; confirm against the live shift state.
        let produced = resolve_character(self.translator.as_ref(), event.vk_code, modifiers.shift);
        if produced != Some(self.target.source()) {
            return Ok(HookDecision::PassThrough);
        }
        EngineStats::bump(&self.stats.verified);

        let mut intercepted = InterceptedKeyEvent::new(event.vk_code, self.target.replacement());
        self.policy.on_intercepted(&mut intercepted);
        if !intercepted.should_replace {
            EngineStats::bump(&self.stats.declined);
            return Ok(HookDecision::PassThrough);
        }

        match self.injector.inject_character(intercepted.replacement) {
            Ok(()) => {
                EngineStats::bump(&self.stats.replaced);
                Ok(HookDecision::Suppress)
            }
            Err(e) if e.partially_delivered() => {
                // Some of the replacement reached the OS; letting the original
                // through as well would type both characters.
                EngineStats::bump(&self.stats.injection_failures);
                warn!("replacement only partially injected: {e}");
                Ok(HookDecision::Suppress)
            }
            Err(e) => {
                EngineStats::bump(&self.stats.injection_failures);
                Err(e.into())
            }
        }
    }
}

impl KeyEventSink for KeyInterceptor {
    fn on_key_event(&self, event: &RawKeyEvent) -> HookDecision {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process(event))) {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                EngineStats::bump(&self.stats.callback_faults);
                warn!("passing VK 0x{:02X} through after error: {e}", event.vk_code);
                HookDecision::PassThrough
            }
            Err(_) => {
                EngineStats::bump(&self.stats.callback_faults);
                warn!("passing VK 0x{:02X} through after panic in hook callback", event.vk_code);
                HookDecision::PassThrough
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::policy::{MockReplacementPolicy, SubstitutionPolicy};
    use keysub_core::keymap::windows_vk::VK_OEM_3;
    use keysub_core::{KeyEventKind, Translation, SYNTHETIC_INPUT_MARKER};
    use std::sync::atomic::AtomicUsize;

    /// `VK_OEM_3` produces `§` plain and `±` shifted; everything else nothing.
    struct OneKeyLayout;

    impl LayoutTranslator for OneKeyLayout {
        fn translate(&self, vk: u8, shift: bool) -> Translation {
            match (vk, shift) {
                (VK_OEM_3, false) => Translation::Char('§'),
                (VK_OEM_3, true) => Translation::Char('±'),
                _ => Translation::Nothing,
            }
        }
    }

    fn modifiers(state: ModifierState) -> MockModifierStateSource {
        let mut mock = MockModifierStateSource::new();
        mock.expect_current().return_const(state);
        mock
    }

    fn injector_ok() -> MockCharacterInjector {
        let mut mock = MockCharacterInjector::new();
        mock.expect_inject_character().returning(|_| Ok(()));
        mock
    }

    fn interceptor(
        modifiers: MockModifierStateSource,
        injector: MockCharacterInjector,
        policy: Arc<dyn ReplacementPolicy>,
    ) -> KeyInterceptor {
        let interceptor = KeyInterceptor::new(
            SubstitutionTarget::default(),
            Arc::new(OneKeyLayout),
            Arc::new(modifiers),
            Arc::new(injector),
            policy,
        );
        interceptor.set_candidates([VK_OEM_3].into_iter().collect());
        interceptor
    }

    fn enabled() -> Arc<dyn ReplacementPolicy> {
        Arc::new(SubstitutionPolicy::new(true))
    }

    #[test]
    fn test_verified_key_down_is_suppressed_and_replaced() {
        // Arrange
        let mut injector = MockCharacterInjector::new();
        injector
            .expect_inject_character()
            .withf(|&c| c == '`')
            .times(1)
            .returning(|_| Ok(()));
        let sut = interceptor(modifiers(ModifierState::NONE), injector, enabled());

        // Act
        let decision = sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));

        // Assert
        assert_eq!(decision, HookDecision::Suppress);
        assert_eq!(sut.stats().replaced, 1);
        assert_eq!(sut.stats().verified, 1);
    }

    /// Like [`OneKeyLayout`], but every first call of a pair reports the
    /// dead key left over from earlier typing.
    #[derive(Default)]
    struct LeftoverDeadKeyLayout {
        calls: AtomicUsize,
    }

    impl LayoutTranslator for LeftoverDeadKeyLayout {
        fn translate(&self, vk: u8, shift: bool) -> Translation {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Translation::DeadKey('¨')
            } else {
                OneKeyLayout.translate(vk, shift)
            }
        }
    }

    #[test]
    fn test_verification_trusts_second_translation_only() {
        // Arrange
        let layout = Arc::new(LeftoverDeadKeyLayout::default());
        let sut = KeyInterceptor::new(
            SubstitutionTarget::default(),
            layout.clone(),
            Arc::new(modifiers(ModifierState::NONE)),
            Arc::new(injector_ok()),
            enabled(),
        );
        sut.set_candidates([VK_OEM_3].into_iter().collect());

        // Act
        let decision = sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));

        // Assert
        assert_eq!(decision, HookDecision::Suppress);
        assert_eq!(layout.calls.load(Ordering::SeqCst), 2);
    }

    /// Counts every tracing event that reaches the subscriber.
    struct EventCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCounter {
        fn on_event(
            &self,
            _event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_successful_replacement_emits_no_log_events() {
        use tracing_subscriber::layer::SubscriberExt;

        // Arrange
        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(EventCounter(events.clone()));
        let sut = interceptor(modifiers(ModifierState::NONE), injector_ok(), enabled());

        // Act
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..3 {
                assert_eq!(
                    sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3)),
                    HookDecision::Suppress
                );
            }
        });

        // Assert
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert_eq!(sut.stats().replaced, 3);
    }

    #[test]
    fn test_non_candidate_key_never_queries_os() {
        // Arrange: any modifier query or injection would fail the test
        let mut mods = MockModifierStateSource::new();
        mods.expect_current().never();
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().never();
        let sut = interceptor(mods, injector, enabled());

        // Act / Assert
        for vk in (0..=u8::MAX).filter(|&vk| vk != VK_OEM_3) {
            assert_eq!(
                sut.on_key_event(&RawKeyEvent::key_down(vk)),
                HookDecision::PassThrough,
                "VK 0x{vk:02X}"
            );
        }
    }

    #[test]
    fn test_marker_event_passes_through_even_on_candidate_key() {
        // Arrange
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().never();
        let sut = interceptor(modifiers(ModifierState::NONE), injector, enabled());
        let mut event = RawKeyEvent::key_down(VK_OEM_3);
        event.extra_info = SYNTHETIC_INPUT_MARKER;
        event.is_injected = true;

        // Act
        let decision = sut.on_key_event(&event);

        // Assert
        assert_eq!(decision, HookDecision::PassThrough);
        assert_eq!(sut.stats().synthetic_skipped, 1);
    }

    #[test]
    fn test_key_up_passes_through() {
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().never();
        let sut = interceptor(modifiers(ModifierState::NONE), injector, enabled());

        let event = RawKeyEvent {
            kind: KeyEventKind::KeyUp,
            ..RawKeyEvent::key_down(VK_OEM_3)
        };

        assert_eq!(sut.on_key_event(&event), HookDecision::PassThrough);
    }

    #[test]
    fn test_ctrl_or_alt_held_always_passes_through() {
        let combos = [
            ModifierState {
                ctrl: true,
                ..ModifierState::NONE
            },
            ModifierState {
                alt: true,
                ..ModifierState::NONE
            },
            ModifierState {
                ctrl: true,
                alt: true,
                shift: false,
            },
            ModifierState {
                ctrl: true,
                alt: true,
                shift: true,
            },
        ];
        for state in combos {
            // Arrange
            let mut injector = MockCharacterInjector::new();
            injector.expect_inject_character().never();
            let sut = interceptor(modifiers(state), injector, enabled());

            // Act
            let decision = sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));

            // Assert
            assert_eq!(decision, HookDecision::PassThrough, "{state:?}");
            assert_eq!(sut.stats().verified, 0);
        }
    }

    #[test]
    fn test_shift_state_that_does_not_produce_source_passes_through() {
        // Shift+OEM_3 produces '±', not the source character.
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().never();
        let sut = interceptor(modifiers(ModifierState::SHIFT), injector, enabled());

        assert_eq!(
            sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3)),
            HookDecision::PassThrough
        );
    }

    #[test]
    fn test_disabled_policy_never_suppresses() {
        // Arrange
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().never();
        let policy = Arc::new(SubstitutionPolicy::new(false));
        let sut = interceptor(modifiers(ModifierState::NONE), injector, policy);

        // Act
        let decisions: Vec<_> = (0..5)
            .map(|_| sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3)))
            .collect();

        // Assert
        assert!(decisions.iter().all(|d| *d == HookDecision::PassThrough));
        assert_eq!(sut.stats().declined, 5);
        assert_eq!(sut.stats().replaced, 0);
    }

    #[test]
    fn test_policy_can_override_replacement_character() {
        // Arrange
        let mut policy = MockReplacementPolicy::new();
        policy
            .expect_on_intercepted()
            .times(1)
            .returning(|event| event.replacement = '~');
        let mut injector = MockCharacterInjector::new();
        injector
            .expect_inject_character()
            .withf(|&c| c == '~')
            .times(1)
            .returning(|_| Ok(()));
        let sut = interceptor(modifiers(ModifierState::NONE), injector, Arc::new(policy));

        // Act / Assert
        assert_eq!(
            sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3)),
            HookDecision::Suppress
        );
    }

    #[test]
    fn test_policy_receives_verified_vk_code() {
        let mut policy = MockReplacementPolicy::new();
        policy
            .expect_on_intercepted()
            .withf(|event| event.vk_code() == VK_OEM_3 && event.should_replace)
            .times(1)
            .return_const(());
        let sut = interceptor(modifiers(ModifierState::NONE), injector_ok(), Arc::new(policy));

        sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));
    }

    #[test]
    fn test_failed_injection_passes_original_through() {
        // Arrange: nothing reached the OS
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().returning(|_| {
            Err(InjectionError::Incomplete {
                sent: 0,
                requested: 2,
            })
        });
        let sut = interceptor(modifiers(ModifierState::NONE), injector, enabled());

        // Act
        let decision = sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));

        // Assert
        assert_eq!(decision, HookDecision::PassThrough);
        let stats = sut.stats();
        assert_eq!(stats.injection_failures, 1);
        assert_eq!(stats.callback_faults, 1);
        assert_eq!(stats.replaced, 0);
    }

    #[test]
    fn test_partial_injection_still_suppresses_original() {
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().returning(|_| {
            Err(InjectionError::Incomplete {
                sent: 1,
                requested: 2,
            })
        });
        let sut = interceptor(modifiers(ModifierState::NONE), injector, enabled());

        let decision = sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));

        assert_eq!(decision, HookDecision::Suppress);
        assert_eq!(sut.stats().injection_failures, 1);
        assert_eq!(sut.stats().callback_faults, 0);
    }

    #[test]
    fn test_panic_in_policy_is_contained() {
        // Arrange
        struct ExplodingPolicy;
        impl ReplacementPolicy for ExplodingPolicy {
            fn on_intercepted(&self, _event: &mut InterceptedKeyEvent) {
                panic!("policy exploded");
            }
        }
        let sut = interceptor(
            modifiers(ModifierState::NONE),
            injector_ok(),
            Arc::new(ExplodingPolicy),
        );

        // Act
        let decision = sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3));

        // Assert
        assert_eq!(decision, HookDecision::PassThrough);
        assert_eq!(sut.stats().callback_faults, 1);
    }

    #[test]
    fn test_empty_candidate_set_intercepts_nothing() {
        let mut injector = MockCharacterInjector::new();
        injector.expect_inject_character().never();
        let sut = interceptor(modifiers(ModifierState::NONE), injector, enabled());
        sut.set_candidates(CandidateKeySet::empty());

        assert_eq!(
            sut.on_key_event(&RawKeyEvent::key_down(VK_OEM_3)),
            HookDecision::PassThrough
        );
    }

    #[test]
    fn test_partially_delivered_classification() {
        let partial = InjectionError::Incomplete {
            sent: 1,
            requested: 2,
        };
        let nothing = InjectionError::Incomplete {
            sent: 0,
            requested: 2,
        };
        assert!(partial.partially_delivered());
        assert!(!nothing.partially_delivered());
    }
}
