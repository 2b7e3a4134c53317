//! TOML-based configuration for the `keysub` host.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\KeySub\config.toml`
//! - Linux:    `~/.config/keysub/config.toml`
//! - macOS:    `~/Library/Application Support/KeySub/config.toml`
//!
//! ```toml
//! [general]
//! log_level = "info"
//! start_enabled = true
//!
//! [hook]
//! boost_thread_priority = true
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section or
//! a missing key all fall back to the values above.  The key mapping itself
//! is not configurable here.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub hook: HookConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is unset: `"error"`, `"warn"`,
    /// `"info"`, `"debug"`, `"trace"` or a full filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether substitution is active as soon as the hook is installed.
    #[serde(default = "default_true")]
    pub start_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HookConfig {
    /// Run the hook thread at time-critical priority.
    #[serde(default = "default_true")]
    pub boost_thread_priority: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            start_enabled: default_true(),
        }
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            boost_thread_priority: default_true(),
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolves the platform config directory including the `KeySub` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeySub"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keysub"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeySub")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("keysub_test_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_default_config_enables_substitution_and_boost() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.general.log_level, "info");
        assert!(cfg.general.start_enabled);
        assert!(cfg.hook.boost_thread_priority);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_only_given_keys() {
        // Arrange
        let toml_str = r#"
[general]
start_enabled = false
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert!(!cfg.general.start_enabled);
        assert_eq!(cfg.general.log_level, "info");
        assert!(cfg.hook.boost_thread_priority);
    }

    #[test]
    fn test_full_toml_is_read() {
        let toml_str = r#"
[general]
log_level = "keysub_engine=debug"
start_enabled = true

[hook]
boost_thread_priority = false
"#;

        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize");

        assert_eq!(cfg.general.log_level, "keysub_engine=debug");
        assert!(!cfg.hook.boost_thread_priority);
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = scratch_dir("missing").join("config.toml");

        let cfg = load_config_from(&path).expect("missing file is not an error");

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_reads_file() {
        // Arrange
        let dir = scratch_dir("reads");
        let path = dir.join("config.toml");
        std::fs::write(&path, "[hook]\nboost_thread_priority = false\n").expect("write");

        // Act
        let cfg = load_config_from(&path).expect("load");

        // Assert
        assert!(!cfg.hook.boost_thread_priority);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let dir = scratch_dir("malformed");
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").expect("write");

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_directory_is_io_error() {
        let dir = scratch_dir("is_dir");

        let result = load_config_from(&dir);

        assert!(matches!(result, Err(ConfigError::Io { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped environment is also acceptable.
    }
}
