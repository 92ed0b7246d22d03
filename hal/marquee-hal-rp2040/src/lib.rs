//! RP2040-specific HAL for the marquee firmware
//!
//! Implements the shared `marquee-hal` traits on top of embassy-rp:
//!
//! - Flash storage driver (implements `marquee_hal::FlashStorage`)
//! - SPI adapter for the LED matrix chain (implements `marquee_hal::SpiBus`)
//! - Output pin adapter for the chain's LOAD line (implements `marquee_hal::OutputPin`)

#![no_std]

pub mod flash;
pub mod gpio;
pub mod spi;

// Re-export shared traits from marquee-hal for convenience
pub use marquee_hal::{FlashStorage as FlashStorageTrait, StorageKey};

pub use flash::Rp2040FlashStorage;
pub use gpio::Rp2040Output;
pub use spi::{spi_config, Rp2040Spi};
