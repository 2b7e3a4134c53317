//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory and supplies defaults on first run.

pub mod config;
