//! Assembles an [`InterceptionEngine`] from the adapters of the current OS.

use std::sync::Arc;

use keysub_core::SubstitutionTarget;

use crate::application::engine::{HookError, InterceptionEngine};
use crate::application::policy::ReplacementPolicy;
use crate::infrastructure::storage::config::HookConfig;

/// Builds an engine wired to the Windows hook, layout, modifier and
/// injection adapters.
#[cfg(target_os = "windows")]
pub fn platform_engine(
    target: SubstitutionTarget,
    hook_config: &HookConfig,
    policy: Arc<dyn ReplacementPolicy>,
) -> Result<InterceptionEngine, HookError> {
    use crate::application::engine::EngineParts;
    use crate::infrastructure::injection::windows::WindowsCharacterInjector;
    use crate::infrastructure::input_hook::windows::WindowsKeyboardHook;
    use crate::infrastructure::keyboard_layout::windows::{
        WindowsLayoutTranslator, WindowsModifierState,
    };

    Ok(InterceptionEngine::new(
        target,
        EngineParts {
            hook: Box::new(WindowsKeyboardHook::new(hook_config.boost_thread_priority)),
            translator: Arc::new(WindowsLayoutTranslator::new()),
            modifiers: Arc::new(WindowsModifierState::new()),
            injector: Arc::new(WindowsCharacterInjector::new()),
            policy,
        },
    ))
}

/// Low-level keyboard hooks and Unicode injection are only implemented for
/// Windows.
#[cfg(not(target_os = "windows"))]
pub fn platform_engine(
    _target: SubstitutionTarget,
    _hook_config: &HookConfig,
    _policy: Arc<dyn ReplacementPolicy>,
) -> Result<InterceptionEngine, HookError> {
    Err(HookError::UnsupportedPlatform(std::env::consts::OS.to_string()))
}
