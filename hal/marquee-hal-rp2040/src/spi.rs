//! SPI adapter for the LED matrix chain
//!
//! The MAX7219 chain is write-only, so the blocking embassy-rp SPI driver
//! created with `Spi::new_blocking_txonly` is enough. Any embedded-hal
//! `SpiBus` is accepted to keep the wrapper independent of the instance.

use embassy_rp::spi::{Config, Phase, Polarity};
use embedded_hal::spi::SpiBus as EhSpiBus;
use marquee_hal::SpiConfig;

/// Build an embassy-rp SPI config from the shared one
pub fn spi_config(cfg: &SpiConfig) -> Config {
    let mut config = Config::default();
    config.frequency = cfg.frequency;
    config.polarity = if cfg.mode.idle_high() {
        Polarity::IdleHigh
    } else {
        Polarity::IdleLow
    };
    config.phase = if cfg.mode.capture_on_second_edge() {
        Phase::CaptureOnSecondTransition
    } else {
        Phase::CaptureOnFirstTransition
    };
    config
}

/// RP2040 SPI master implementing `marquee_hal::SpiBus`
pub struct Rp2040Spi<B> {
    bus: B,
}

impl<B: EhSpiBus<u8>> Rp2040Spi<B> {
    /// Wrap a configured bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B: EhSpiBus<u8>> marquee_hal::SpiBus for Rp2040Spi<B> {
    type Error = B::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.bus.flush()
    }
}
