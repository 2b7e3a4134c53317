//! Windows low-level keyboard hook implementation.
//!
//! This module installs a `WH_KEYBOARD_LL` hook from a dedicated Win32
//! message-loop thread.  Windows invokes low-level hook callbacks on the
//! thread that installed the hook, from inside its message loop, so:
//!
//! - the sink is stored in a thread-local of the hook thread and is only
//!   touched by that thread;
//! - `uninstall` posts `WM_QUIT` to the hook thread and joins it.  The thread
//!   unhooks and drops the sink after leaving its message loop, which cannot
//!   happen while a callback is running.  No lock is ever taken inside the
//!   callback.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use keysub_core::{KeyEventKind, RawKeyEvent};
use tracing::{debug, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::{
    GetCurrentThread, GetCurrentThreadId, SetThreadPriority, THREAD_PRIORITY_TIME_CRITICAL,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS,
    LLKHF_INJECTED, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT,
    WM_SYSKEYDOWN, WM_SYSKEYUP,
};

use crate::application::engine::{HookError, KeyboardHook};
use crate::application::intercept_key::{HookDecision, KeyEventSink};

thread_local! {
    /// Sink of the hook installed by this thread.  Set before the hook is
    /// registered, cleared after it is unregistered.
    static HOOK_SINK: RefCell<Option<Arc<dyn KeyEventSink>>> = const { RefCell::new(None) };
}

struct HookThread {
    id: u32,
    handle: JoinHandle<()>,
}

/// Windows low-level keyboard hook.
pub struct WindowsKeyboardHook {
    boost_priority: bool,
    thread: Option<HookThread>,
}

impl WindowsKeyboardHook {
    /// Creates an uninstalled hook.  With `boost_priority` the hook thread
    /// runs at `THREAD_PRIORITY_TIME_CRITICAL` to keep callback latency low.
    pub fn new(boost_priority: bool) -> Self {
        Self {
            boost_priority,
            thread: None,
        }
    }
}

impl Default for WindowsKeyboardHook {
    fn default() -> Self {
        Self::new(true)
    }
}

impl KeyboardHook for WindowsKeyboardHook {
    fn install(&mut self, sink: Arc<dyn KeyEventSink>) -> Result<(), HookError> {
        if self.thread.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, HookError>>();
        let boost = self.boost_priority;
        let handle = thread::Builder::new()
            .name("keysub-hook-loop".to_string())
            .spawn(move || run_hook_thread(sink, boost, ready_tx))
            .map_err(HookError::ThreadSpawn)?;

        // Block until the hook thread reports whether SetWindowsHookExW succeeded.
        match ready_rx.recv() {
            Ok(Ok(id)) => {
                debug!(thread_id = id, "hook thread running");
                self.thread = Some(HookThread { id, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(HookError::ThreadLost)
            }
        }
    }

    fn uninstall(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        // SAFETY: `id` is the id of our live hook thread, whose message
        // queue was created before it reported ready.
        self.thread = stop_hook_thread(thread, |id| unsafe {
            PostThreadMessageW(id, WM_QUIT, WPARAM(0), LPARAM(0))
        });
    }

    fn is_installed(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for WindowsKeyboardHook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// Asks the hook thread to quit and joins it.
///
/// Returns the thread back when it could not be signalled: it still owns a
/// live hook, so the caller must keep treating the hook as installed.
fn stop_hook_thread<E: std::fmt::Display>(
    thread: HookThread,
    post_quit: impl FnOnce(u32) -> Result<(), E>,
) -> Option<HookThread> {
    if let Err(e) = post_quit(thread.id) {
        // Joining would hang.
        warn!("failed to signal hook thread {}: {e}", thread.id);
        return Some(thread);
    }
    if thread.handle.join().is_err() {
        warn!("hook thread panicked during shutdown");
    }
    None
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_thread(
    sink: Arc<dyn KeyEventSink>,
    boost_priority: bool,
    ready: mpsc::Sender<Result<u32, HookError>>,
) {
    if boost_priority {
        // SAFETY: GetCurrentThread returns a pseudo-handle valid on this thread.
        let boosted =
            unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) };
        if let Err(e) = boosted {
            warn!("could not raise hook thread priority: {e}");
        }
    }

    let mut msg = MSG::default();
    // SAFETY: PeekMessageW forces creation of this thread's message queue so
    // that PostThreadMessageW(WM_QUIT) from `uninstall` cannot be lost.
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }

    HOOK_SINK.with(|slot| *slot.borrow_mut() = Some(sink));

    // SAFETY: a null module name returns the handle of the current executable.
    let module = unsafe { GetModuleHandleW(None) }.ok();
    // SAFETY: keyboard_hook_proc matches HOOKPROC and lives for the whole
    // program; the hook is removed on this thread before it exits.
    let hook = unsafe {
        SetWindowsHookExW(
            WH_KEYBOARD_LL,
            Some(keyboard_hook_proc),
            module.map(|m| HINSTANCE(m.0)),
            0,
        )
    };
    let hook = match hook {
        Ok(hook) => hook,
        Err(e) => {
            HOOK_SINK.with(|slot| slot.borrow_mut().take());
            let _ = ready.send(Err(HookError::InstallFailed(e.to_string())));
            return;
        }
    };

    // SAFETY: GetCurrentThreadId has no preconditions.
    let _ = ready.send(Ok(unsafe { GetCurrentThreadId() }));
    drop(ready);

    // Win32 message loop – GetMessageW returns 0 on WM_QUIT and -1 on error.
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            DispatchMessageW(&msg);
        }
        if let Err(e) = UnhookWindowsHookEx(hook) {
            warn!("UnhookWindowsHookEx failed: {e}");
        }
    }

    HOOK_SINK.with(|slot| slot.borrow_mut().take());
    debug!("hook thread exiting");
}

/// Converts a hook struct to a [`RawKeyEvent`]; `None` for messages that are
/// not key presses or releases.
fn to_raw_event(kbs: &KBDLLHOOKSTRUCT, message: u32) -> Option<RawKeyEvent> {
    let kind = match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyEventKind::KeyDown,
        WM_KEYUP | WM_SYSKEYUP => KeyEventKind::KeyUp,
        _ => return None,
    };
    Some(RawKeyEvent {
        vk_code: kbs.vkCode as u8,
        scan_code: kbs.scanCode as u16,
        kind,
        time_ms: kbs.time,
        extra_info: kbs.dwExtraInfo,
        is_injected: (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0),
    })
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// This function is called by Windows from the hook message loop thread.
/// It must return quickly to avoid hook removal by the OS.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

    if let Some(event) = to_raw_event(kbs, w_param.0 as u32) {
        let decision = HOOK_SINK
            .try_with(|slot| slot.borrow().as_ref().map(|sink| sink.on_key_event(&event)))
            .ok()
            .flatten();
        if decision == Some(HookDecision::Suppress) {
            // Consume the event: do not call CallNextHookEx.
            return LRESULT(1);
        }
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}
