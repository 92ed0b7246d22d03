//! SPI bus abstractions

/// SPI bus master (write-mostly)
///
/// Chip select is not part of the bus; callers frame transactions with
/// their own [`OutputPin`](crate::gpio::OutputPin).
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Write data, discarding anything clocked in
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until all queued words have left the shift register
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Clock polarity/phase
    pub mode: SpiMode,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            // MAX7219 tops out at 10 MHz; leave margin for long module chains
            frequency: 4_000_000,
            mode: SpiMode::Mode0,
        }
    }
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Clock idles high
    pub fn idle_high(self) -> bool {
        matches!(self, SpiMode::Mode2 | SpiMode::Mode3)
    }

    /// Data captured on the second clock transition
    pub fn capture_on_second_edge(self) -> bool {
        matches!(self, SpiMode::Mode1 | SpiMode::Mode3)
    }
}
