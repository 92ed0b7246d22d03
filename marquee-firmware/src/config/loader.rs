//! Settings persistence
//!
//! Loads settings from flash storage, falling back to the embedded defaults
//! when flash is empty or holds settings from an incompatible build.

use core::str;
use defmt::*;

use marquee_core::config::{Settings, SETTINGS_VERSION};
use marquee_hal_rp2040::flash::{FlashError, StorageKey};
use marquee_hal_rp2040::FlashStorageTrait;

use super::toml::parse_settings;
use crate::link::LinkError;

/// Maximum serialized settings size (binary)
const MAX_SETTINGS_SIZE: usize = 512;

/// Settings persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Provisioning did not complete in time
    Timeout,
    /// Coprocessor request failed
    Link(LinkError),
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Settings version mismatch
    VersionMismatch,
}

impl From<LinkError> for ConfigError {
    fn from(e: LinkError) -> Self {
        ConfigError::Link(e)
    }
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

/// Settings persistence manager
pub struct ConfigPersistence<S> {
    storage: S,
}

impl<S: FlashStorageTrait> ConfigPersistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load settings from flash
    pub async fn load(&mut self) -> Result<Settings, ConfigError> {
        let mut buffer = [0u8; MAX_SETTINGS_SIZE];
        let len = self.storage.read(StorageKey::Settings, &mut buffer).await?;

        debug!("Read {} bytes of settings from flash", len);

        let settings: Settings =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

        if !settings.is_current() {
            warn!(
                "Settings version mismatch: found {}, expected {}",
                settings.version, SETTINGS_VERSION
            );
            return Err(ConfigError::VersionMismatch);
        }

        Ok(settings)
    }

    /// Persist settings
    ///
    /// The storage layer replaces the previous value atomically, so an
    /// interrupted save leaves the old settings readable.
    pub async fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let mut buffer = [0u8; MAX_SETTINGS_SIZE];
        let used =
            postcard::to_slice(settings, &mut buffer).map_err(|_| ConfigError::Serialize)?;

        self.storage.write(StorageKey::Settings, used).await?;
        info!("Settings saved ({} bytes)", used.len());
        Ok(())
    }

    /// Boot-time settings: flash, then the embedded TOML, then built-ins
    pub async fn load_or_default(&mut self, embedded_toml: &str) -> Settings {
        match self.load().await {
            Ok(settings) => {
                info!("Loaded settings from flash");
                return settings;
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No settings in flash, using embedded defaults");
            }
            Err(ConfigError::Flash(e)) => {
                warn!("Settings storage failed: {:?}, using embedded defaults", e);
                match self.storage.recover(e).await {
                    Ok(true) => warn!("Settings partition erased"),
                    Ok(false) => {}
                    Err(e) => error!("Failed to erase settings partition: {:?}", e),
                }
            }
            Err(e) => {
                warn!("Stored settings unusable: {:?}, using embedded defaults", e);
            }
        }

        match load_toml(embedded_toml.as_bytes()) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Embedded settings invalid: {:?}, using built-in values", e);
                Settings::new()
            }
        }
    }
}

/// Parse settings from TOML bytes
pub fn load_toml(bytes: &[u8]) -> Result<Settings, ConfigError> {
    let text = str::from_utf8(bytes).map_err(|_| ConfigError::InvalidUtf8)?;
    parse_settings(text).map_err(|e| {
        warn!("TOML parse error: {:?}", e);
        ConfigError::TomlParse
    })
}

/// Log a summary of the active settings
pub fn log_settings_summary(settings: &Settings) {
    info!(
        "Broker {}:{} topic {} (anonymous={})",
        settings.broker.host.as_str(),
        settings.broker.port,
        settings.broker.topic.as_str(),
        settings.broker.anonymous
    );
    debug!(
        "  display: {} modules, {} ms/column, intensity {}",
        settings.display.modules, settings.display.scroll_interval_ms, settings.display.intensity
    );
    debug!(
        "  link: ceiling {}, retry {} ms, ping {} ms",
        settings.link.retry_ceiling, settings.link.retry_delay_ms, settings.link.ping_interval_ms
    );
}
