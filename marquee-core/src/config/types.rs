//! Settings type definitions
//!
//! Settings are stored in flash as postcard-serialized binary data and
//! travel to the network coprocessor in the same encoding.

use heapless::String;

use crate::link::{
    LinkConfig, DEFAULT_PING_INTERVAL_MS, DEFAULT_RETRY_CEILING, DEFAULT_RETRY_DELAY_MS,
};
use crate::render::{RenderConfig, DEFAULT_CHAR_SPACING};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current settings layout version
pub const SETTINGS_VERSION: u8 = 1;

/// Maximum broker host name length
pub const MAX_HOST_LEN: usize = 64;

/// Maximum broker user name length
pub const MAX_USER_LEN: usize = 20;

/// Maximum broker key length
pub const MAX_KEY_LEN: usize = 32;

/// Maximum topic length
pub const MAX_TOPIC_LEN: usize = 64;

/// Maximum access-point name length
pub const MAX_AP_NAME_LEN: usize = 32;

/// Maximum access-point password length
pub const MAX_AP_PASSWORD_LEN: usize = 64;

/// Columns per LED matrix module
pub const COLUMNS_PER_MODULE: u16 = 8;

/// Build a bounded string, truncating at a character boundary
pub fn bounded<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Message broker session settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrokerSettings {
    /// Broker host name
    pub host: String<MAX_HOST_LEN>,
    /// Broker TCP port
    pub port: u16,
    /// User name (ignored when anonymous)
    pub user: String<MAX_USER_LEN>,
    /// Password or key (ignored when anonymous)
    pub key: String<MAX_KEY_LEN>,
    /// Connect without credentials
    pub anonymous: bool,
    /// Topic carrying display messages
    pub topic: String<MAX_TOPIC_LEN>,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: bounded("test.mosquitto.org"),
            port: 1883,
            user: bounded("admin"),
            key: bounded("admin"),
            anonymous: false,
            topic: bounded("marquee/incoming"),
        }
    }
}

/// LED chain and scrolling settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplaySettings {
    /// Number of 8x8 modules in the chain
    pub modules: u8,
    /// Milliseconds per scrolled column
    pub scroll_interval_ms: u16,
    /// Blank columns between characters
    pub char_spacing: u8,
    /// Blank columns after the message; half the width when unset
    pub end_gap: Option<u8>,
    /// Brightness, 0..=15
    pub intensity: u8,
    /// Modules mounted with columns mirrored
    pub reverse_columns: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            modules: 4,
            scroll_interval_ms: 50,
            char_spacing: DEFAULT_CHAR_SPACING,
            end_gap: None,
            intensity: 1,
            reverse_columns: false,
        }
    }
}

impl DisplaySettings {
    /// Total columns across the chain
    pub fn columns(&self) -> u16 {
        self.modules as u16 * COLUMNS_PER_MODULE
    }

    /// Renderer parameters for this display
    pub fn render_config(&self) -> RenderConfig {
        match self.end_gap {
            Some(gap) => RenderConfig::new(self.char_spacing, gap),
            None => RenderConfig::for_display(self.columns(), self.char_spacing),
        }
    }
}

/// Connectivity supervisor settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkSettings {
    /// Consecutive failures before reconfiguration (clamped to 3..=11)
    pub retry_ceiling: u8,
    /// Delay between connect attempts
    pub retry_delay_ms: u32,
    /// Liveness probe interval
    pub ping_interval_ms: u32,
    /// Upper bound for one connect attempt
    pub connect_timeout_ms: u32,
    /// Upper bound for one liveness probe
    pub ping_timeout_ms: u32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            retry_ceiling: DEFAULT_RETRY_CEILING,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
            connect_timeout_ms: 15_000,
            ping_timeout_ms: 2_000,
        }
    }
}

impl LinkSettings {
    /// Supervisor parameters
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig::new(
            self.retry_ceiling,
            self.retry_delay_ms,
            self.ping_interval_ms,
        )
    }
}

/// Provisioning portal settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortalSettings {
    /// Access point name shown while provisioning
    pub ap_name: String<MAX_AP_NAME_LEN>,
    /// Access point password
    pub ap_password: String<MAX_AP_PASSWORD_LEN>,
    /// Give up after this many seconds
    pub timeout_s: u16,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            ap_name: bounded("LEDConfig"),
            ap_password: bounded("admin"),
            timeout_s: 180,
        }
    }
}

/// Complete device settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    /// Layout version for compatibility checks
    pub version: u8,
    /// Broker session
    pub broker: BrokerSettings,
    /// LED chain
    pub display: DisplaySettings,
    /// Supervisor timing
    pub link: LinkSettings,
    /// Provisioning portal
    pub portal: PortalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            broker: BrokerSettings::default(),
            display: DisplaySettings::default(),
            link: LinkSettings::default(),
            portal: PortalSettings::default(),
        }
    }
}

impl Settings {
    /// Create settings with built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if these settings were written by a compatible build
    pub fn is_current(&self) -> bool {
        self.version == SETTINGS_VERSION
    }
}
