//! Virtual-key code tables.
//!
//! Only the Windows VK space is modelled; the engine has no other backend.

pub mod windows_vk;

pub use windows_vk::{vk_name, FALLBACK_OEM_KEYS, PROBE_SCAN_RANGE};
