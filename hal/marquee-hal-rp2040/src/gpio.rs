//! Output pin adapter
//!
//! Wraps any embedded-hal output (in practice `embassy_rp::gpio::Output`)
//! so it can drive `marquee_hal::OutputPin` consumers. The level is cached
//! because reading back a stateful pin needs `&mut` in embedded-hal 1.0.

use embedded_hal::digital::OutputPin as EhOutputPin;

/// RP2040 push-pull output
pub struct Rp2040Output<P> {
    pin: P,
    high: bool,
}

impl<P: EhOutputPin> Rp2040Output<P> {
    /// Wrap a pin, driving it to `initial_high`
    pub fn new(mut pin: P, initial_high: bool) -> Self {
        // embassy-rp outputs are infallible
        let _ = pin.set_state(initial_high.into());
        Self {
            pin,
            high: initial_high,
        }
    }
}

impl<P: EhOutputPin> marquee_hal::OutputPin for Rp2040Output<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
