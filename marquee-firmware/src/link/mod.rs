//! Network coprocessor link
//!
//! The coprocessor runs the broker session and the provisioning portal.
//! This side sends framed requests over UART and waits for the
//! matching reply on [`REPLY_CHANNEL`](crate::channels::REPLY_CHANNEL),
//! which the RX task fills.

mod transport;

pub use transport::{CoprocessorLink, LinkError};

use embassy_time::Instant;
use marquee_core::traits::Clock;

/// Monotonic milliseconds since boot
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
