//! Column-addressed LED display

use core::ops::Range;

/// Errors reported by a display driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transfer to the display failed
    Communication,
    /// Column index past the end of the display
    OutOfRange,
}

/// Display made of a row of byte-wide pixel columns
///
/// Column 0 is the leftmost column; bit 0 of a column byte is the top pixel.
/// Writes are buffered until [`refresh`](DisplayDriver::refresh).
pub trait DisplayDriver {
    /// Stage a column value
    fn set_column(&mut self, index: u16, column: u8) -> Result<(), DisplayError>;

    /// Push staged columns in `range` to the hardware
    fn refresh(&mut self, range: Range<u16>) -> Result<(), DisplayError>;

    /// Total number of columns
    fn columns(&self) -> u16;
}
