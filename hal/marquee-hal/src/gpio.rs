//! Digital outputs driven outside a bus peripheral

/// Push-pull output line
///
/// The MAX7219 LOAD line is one of these. It is held low for a whole chain
/// transfer and latches every device on the rising edge.
pub trait OutputPin {
    fn set_high(&mut self);

    fn set_low(&mut self);

    /// Last level written; no readback from the pad
    fn is_set_high(&self) -> bool;
}
