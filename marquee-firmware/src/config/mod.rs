//! Settings loading and parsing
//!
//! Loads settings from flash or the embedded defaults. The embedded file is
//! TOML parsed by a small no_std parser.

pub mod loader;
pub mod toml;

pub use loader::{log_settings_summary, ConfigError, ConfigPersistence};
pub use toml::parse_settings;
