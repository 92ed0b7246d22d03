//! Marquee - scrolling LED matrix firmware
//!
//! Main firmware binary for RP2040 boards driving a chain of MAX7219 8x8
//! modules. Text arrives from a UART-attached network coprocessor and
//! scrolls across the chain one column at a time.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::spi::Spi;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use marquee_drivers::display::{Max7219, Max7219Config};
use marquee_hal::SpiConfig;
use marquee_hal_rp2040::{spi_config, Rp2040FlashStorage, Rp2040Output, Rp2040Spi};

use crate::config::{log_settings_summary, ConfigPersistence};
use crate::link::CoprocessorLink;
use crate::tasks::{Display, MAX_MODULES};

/// Embedded default settings (compiled into firmware)
/// Edit marquee.toml and rebuild to customize
const EMBEDDED_SETTINGS: &str = include_str!("../marquee.toml");

mod channels;
mod config;
mod link;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// UART buffers (must live forever)
static LINK_TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static LINK_RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static CONSOLE_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static CONSOLE_RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Marquee firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Settings: flash first, then the embedded file
    let flash = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let mut persistence = ConfigPersistence::new(flash);
    let settings = persistence.load_or_default(EMBEDDED_SETTINGS).await;
    log_settings_summary(&settings);

    // LED chain: SPI0 on GPIO18 (CLK) / GPIO19 (DIN), LOAD on GPIO17
    let mut display_settings = settings.display.clone();
    if display_settings.modules as usize > MAX_MODULES {
        warn!(
            "{} modules configured, driving the first {}",
            display_settings.modules, MAX_MODULES
        );
        display_settings.modules = MAX_MODULES as u8;
    }

    let spi = Spi::new_blocking_txonly(
        p.SPI0,
        p.PIN_18,
        p.PIN_19,
        spi_config(&SpiConfig::default()),
    );
    let load = Rp2040Output::new(Output::new(p.PIN_17, Level::High), true);
    let mut display: Display = Max7219::new(
        Rp2040Spi::new(spi),
        load,
        Max7219Config {
            devices: display_settings.modules,
            reverse_columns: display_settings.reverse_columns,
        },
    );
    if let Err(e) = display.init(display_settings.intensity) {
        error!("Display init failed: {:?}", e);
    }
    info!("Display initialized: {} modules", display.devices());

    // Coprocessor on UART0 (GPIO0 TX, GPIO1 RX)
    let link_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default())
        .into_buffered::<UART0>(
            Irqs,
            LINK_TX_BUF.init([0u8; 512]),
            LINK_RX_BUF.init([0u8; 512]),
        );
    let (link_tx, link_rx) = link_uart.split();
    let link = CoprocessorLink::new(link_tx, &settings.link);
    info!("Coprocessor UART initialized");

    // Operator console on UART1 (GPIO4 TX, GPIO5 RX)
    let console_uart = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, UartConfig::default())
        .into_buffered::<UART1>(
            Irqs,
            CONSOLE_TX_BUF.init([0u8; 16]),
            CONSOLE_RX_BUF.init([0u8; 64]),
        );
    let (_console_tx, console_rx) = console_uart.split();

    spawner
        .spawn(tasks::scroll_task(display, display_settings))
        .unwrap();
    spawner.spawn(tasks::link_rx_task(link_rx)).unwrap();
    spawner
        .spawn(tasks::link_task(link, persistence, settings))
        .unwrap();
    spawner.spawn(tasks::console_task(console_rx)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
