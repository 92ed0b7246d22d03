//! Marquee Hardware Abstraction Layer
//!
//! Traits implemented by chip-specific HALs so the display driver and the
//! settings store can be written once and tested on the host.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  marquee-drivers / marquee-firmware     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  marquee-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ marquee-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! - [`spi::SpiBus`] - SPI master writes (LED matrix chain)
//! - [`gpio::OutputPin`] - Digital outputs (chip select / load line)
//! - [`flash::FlashStorage`] - Persistent key-value storage (settings)

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
pub mod spi;

pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::OutputPin;
pub use spi::{SpiBus, SpiConfig, SpiMode};
