//! Scroll task
//!
//! Advances the marquee one column per scroll interval. Runs forever,
//! independent of the link: the display keeps scrolling the last message
//! while the network is down or being reconfigured.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Instant, Timer};

use marquee_core::config::{DisplaySettings, COLUMNS_PER_MODULE};
use marquee_core::font::SystemFont;
use marquee_core::render::ScrollRenderer;
use marquee_core::scroll::{ScrollScheduler, ScrollSegment};
use marquee_drivers::display::Max7219;
use marquee_hal_rp2040::{Rp2040Output, Rp2040Spi};

use crate::channels::MAILBOX;

/// Longest chain the firmware supports
pub const MAX_MODULES: usize = 16;

const MAX_COLUMNS: usize = MAX_MODULES * COLUMNS_PER_MODULE as usize;

/// The LED chain as wired on the board
pub type Display =
    Max7219<Rp2040Spi<Spi<'static, SPI0, Blocking>>, Rp2040Output<Output<'static>>, MAX_MODULES>;

#[embassy_executor::task]
pub async fn scroll_task(mut display: Display, settings: DisplaySettings) {
    info!(
        "Scroll task started: {} columns every {} ms",
        settings.columns(),
        settings.scroll_interval_ms
    );

    let mut scheduler: ScrollScheduler<MAX_COLUMNS> =
        ScrollScheduler::new(settings.scroll_interval_ms as u32);
    if let Err(e) = scheduler.clear(&mut display) {
        warn!("Failed to blank display: {:?}", e);
    }

    let mut segments = [ScrollSegment::new(
        0..settings.columns(),
        ScrollRenderer::new(settings.render_config()),
        &MAILBOX,
    )];
    let mut passes = 0;

    loop {
        if let Some(due) = scheduler.next_due_ms() {
            Timer::at(Instant::from_millis(due)).await;
        }
        if !scheduler.due(Instant::now().as_millis()) {
            continue;
        }

        if let Err(e) = scheduler.tick(&mut segments, &SystemFont, &mut display) {
            warn!("Display update failed: {:?}", e);
        }

        let renderer = &segments[0].renderer;
        if renderer.passes() != passes {
            passes = renderer.passes();
            trace!("Pass {} of {}", passes, renderer.current());
        }
    }
}
