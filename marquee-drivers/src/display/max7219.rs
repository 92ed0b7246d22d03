//! MAX7219 8x8 LED matrix chain driver
//!
//! Drives daisy-chained MAX7219 devices over SPI with a dedicated LOAD (chip
//! select) line. Every transaction shifts one 16-bit word per device;
//! rising LOAD latches all of them at once.
//!
//! # Layout
//!
//! Display column `c` lives on module `c / 8`. Module 0 is the one farthest
//! from the MCU, so words are shifted out in module order. Modules are
//! wired FC-16 style: digit register `n` drives pixel row `n`, and the data
//! byte holds that row's eight pixels with the leftmost column in bit 7
//! (bit 0 when `reverse_columns` is set).
//!
//! Column bytes use bit 0 for the top row, matching the font.

use core::ops::Range;

use marquee_core::traits::{DisplayDriver, DisplayError};
use marquee_hal::{OutputPin, SpiBus};

/// MAX7219 register addresses
pub mod reg {
    /// No operation; used to skip a device in the chain
    pub const NOOP: u8 = 0x00;
    /// First digit register (row 0)
    pub const DIGIT0: u8 = 0x01;
    /// BCD decode mode
    pub const DECODE_MODE: u8 = 0x09;
    /// Brightness (0-15)
    pub const INTENSITY: u8 = 0x0A;
    /// Number of scanned digits minus one
    pub const SCAN_LIMIT: u8 = 0x0B;
    /// 0 = shutdown, 1 = normal operation
    pub const SHUTDOWN: u8 = 0x0C;
    /// 1 = all segments on
    pub const DISPLAY_TEST: u8 = 0x0F;
}

/// Columns (and rows) per module
pub const MODULE_SIZE: usize = 8;

/// Highest intensity setting
pub const MAX_INTENSITY: u8 = 15;

/// Chain configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Max7219Config {
    /// Modules in the chain
    pub devices: u8,
    /// Modules are mounted mirrored left to right
    pub reverse_columns: bool,
}

impl Default for Max7219Config {
    fn default() -> Self {
        Self {
            devices: 4,
            reverse_columns: false,
        }
    }
}

/// MAX7219 chain with a column buffer for up to `MAX_DEVICES` modules
pub struct Max7219<S, P, const MAX_DEVICES: usize> {
    spi: S,
    load: P,
    devices: usize,
    reverse_columns: bool,
    columns: [[u8; MODULE_SIZE]; MAX_DEVICES],
}

impl<S, P, const MAX_DEVICES: usize> Max7219<S, P, MAX_DEVICES>
where
    S: SpiBus,
    P: OutputPin,
{
    /// Create a driver; the device count is clamped to `1..=MAX_DEVICES`
    ///
    /// The chain is not touched until [`init`](Self::init).
    pub fn new(spi: S, mut load: P, config: Max7219Config) -> Self {
        load.set_high();
        Self {
            spi,
            load,
            devices: (config.devices as usize).clamp(1, MAX_DEVICES),
            reverse_columns: config.reverse_columns,
            columns: [[0; MODULE_SIZE]; MAX_DEVICES],
        }
    }

    /// Program every device for raw matrix use and blank the chain
    pub fn init(&mut self, intensity: u8) -> Result<(), DisplayError> {
        self.broadcast(reg::DISPLAY_TEST, 0)?;
        self.broadcast(reg::SHUTDOWN, 0)?;
        self.broadcast(reg::DECODE_MODE, 0)?;
        self.broadcast(reg::SCAN_LIMIT, (MODULE_SIZE - 1) as u8)?;
        self.broadcast(reg::INTENSITY, intensity.min(MAX_INTENSITY))?;

        self.columns = [[0; MODULE_SIZE]; MAX_DEVICES];
        self.refresh(0..self.column_count() as u16)?;

        self.broadcast(reg::SHUTDOWN, 1)
    }

    /// Modules in use
    pub fn devices(&self) -> usize {
        self.devices
    }

    /// Buffered column byte
    pub fn column(&self, index: u16) -> Option<u8> {
        let index = index as usize;
        if index >= self.column_count() {
            return None;
        }
        Some(self.columns[index / MODULE_SIZE][index % MODULE_SIZE])
    }

    fn column_count(&self) -> usize {
        self.devices * MODULE_SIZE
    }

    /// Pack one pixel row of a module into a digit register value
    fn row_byte(&self, module: usize, row: usize) -> u8 {
        let mut byte = 0u8;
        for (x, column) in self.columns[module].iter().enumerate() {
            if column & (1 << row) != 0 {
                let bit = if self.reverse_columns { x } else { 7 - x };
                byte |= 1 << bit;
            }
        }
        byte
    }

    /// Write the same register on every device
    fn broadcast(&mut self, register: u8, value: u8) -> Result<(), DisplayError> {
        self.transaction(|_, _| Some((register, value)))
    }

    /// One LOAD-framed transaction; `word` returns `None` for a NO-OP
    fn transaction<F>(&mut self, word: F) -> Result<(), DisplayError>
    where
        F: FnMut(&Self, usize) -> Option<(u8, u8)>,
    {
        self.load.set_low();
        let result = self.shift(word);
        self.load.set_high();
        result
    }

    fn shift<F>(&mut self, mut word: F) -> Result<(), DisplayError>
    where
        F: FnMut(&Self, usize) -> Option<(u8, u8)>,
    {
        for module in 0..self.devices {
            let (register, value) = word(self, module).unwrap_or((reg::NOOP, 0));
            self.spi
                .write(&[register, value])
                .map_err(|_| DisplayError::Communication)?;
        }
        self.spi.flush().map_err(|_| DisplayError::Communication)
    }
}

impl<S, P, const MAX_DEVICES: usize> DisplayDriver for Max7219<S, P, MAX_DEVICES>
where
    S: SpiBus,
    P: OutputPin,
{
    fn set_column(&mut self, index: u16, column: u8) -> Result<(), DisplayError> {
        let index = index as usize;
        if index >= self.column_count() {
            return Err(DisplayError::OutOfRange);
        }
        self.columns[index / MODULE_SIZE][index % MODULE_SIZE] = column;
        Ok(())
    }

    fn refresh(&mut self, range: Range<u16>) -> Result<(), DisplayError> {
        if range.end as usize > self.column_count() {
            return Err(DisplayError::OutOfRange);
        }
        if range.is_empty() {
            return Ok(());
        }

        let first = range.start as usize / MODULE_SIZE;
        let last = (range.end as usize - 1) / MODULE_SIZE;

        for row in 0..MODULE_SIZE {
            self.transaction(|this, module| {
                (first..=last)
                    .contains(&module)
                    .then(|| (reg::DIGIT0 + row as u8, this.row_byte(module, row)))
            })?;
        }
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.column_count() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Low,
        High,
        Write(Vec<u8>),
        Flush,
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct MockSpi {
        log: Log,
        fail: bool,
    }

    impl SpiBus for MockSpi {
        type Error = ();

        fn write(&mut self, data: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.log.borrow_mut().push(Event::Write(data.to_vec()));
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            self.log.borrow_mut().push(Event::Flush);
            Ok(())
        }
    }

    struct MockPin {
        log: Log,
        high: bool,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
            self.log.borrow_mut().push(Event::High);
        }

        fn set_low(&mut self) {
            self.high = false;
            self.log.borrow_mut().push(Event::Low);
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    fn chain(devices: u8, reverse_columns: bool) -> (Max7219<MockSpi, MockPin, 8>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let spi = MockSpi {
            log: log.clone(),
            fail: false,
        };
        let pin = MockPin {
            log: log.clone(),
            high: false,
        };
        let driver = Max7219::new(
            spi,
            pin,
            Max7219Config {
                devices,
                reverse_columns,
            },
        );
        log.borrow_mut().clear();
        (driver, log)
    }

    /// Split the log into the words of each LOAD-framed transaction
    fn transactions(log: &Log) -> Vec<Vec<[u8; 2]>> {
        let mut out = Vec::new();
        let mut current: Option<Vec<[u8; 2]>> = None;
        for event in log.borrow().iter() {
            match event {
                Event::Low => current = Some(Vec::new()),
                Event::Write(bytes) => {
                    if let Some(words) = current.as_mut() {
                        words.push([bytes[0], bytes[1]]);
                    }
                }
                Event::High => {
                    if let Some(words) = current.take() {
                        out.push(words);
                    }
                }
                Event::Flush => {}
            }
        }
        out
    }

    #[test]
    fn test_init_sequence() {
        let (mut driver, log) = chain(4, false);
        driver.init(20).unwrap();

        let tx = transactions(&log);
        // 5 config writes, 8 blank rows, wake up
        assert_eq!(tx.len(), 5 + 8 + 1);
        assert!(tx.iter().all(|words| words.len() == 4));
        assert_eq!(tx[0], [[reg::DISPLAY_TEST, 0]; 4]);
        assert_eq!(tx[1], [[reg::SHUTDOWN, 0]; 4]);
        assert_eq!(tx[2], [[reg::DECODE_MODE, 0]; 4]);
        assert_eq!(tx[3], [[reg::SCAN_LIMIT, 7]; 4]);
        assert_eq!(tx[4], [[reg::INTENSITY, MAX_INTENSITY]; 4]);
        assert_eq!(tx[5], [[reg::DIGIT0, 0]; 4]);
        assert_eq!(tx[12], [[reg::DIGIT0 + 7, 0]; 4]);
        assert_eq!(tx[13], [[reg::SHUTDOWN, 1]; 4]);
    }

    #[test]
    fn test_set_column_bounds() {
        let (mut driver, _) = chain(2, false);
        assert_eq!(driver.columns(), 16);
        assert!(driver.set_column(15, 0xAA).is_ok());
        assert_eq!(driver.column(15), Some(0xAA));
        assert_eq!(driver.set_column(16, 0xAA), Err(DisplayError::OutOfRange));
        assert_eq!(driver.column(16), None);
    }

    #[test]
    fn test_refresh_only_touches_overlapping_modules() {
        let (mut driver, log) = chain(4, false);
        driver.set_column(9, 0x01).unwrap();
        driver.refresh(8..16).unwrap();

        let tx = transactions(&log);
        assert_eq!(tx.len(), 8);
        for (row, words) in tx.iter().enumerate() {
            assert_eq!(words[0], [reg::NOOP, 0]);
            assert_eq!(words[2], [reg::NOOP, 0]);
            assert_eq!(words[3], [reg::NOOP, 0]);
            assert_eq!(words[1][0], reg::DIGIT0 + row as u8);
        }
        // Column 9 is x = 1 in module 1; top pixel only
        assert_eq!(tx[0][1][1], 0b0100_0000);
        assert!(tx[1..].iter().all(|words| words[1][1] == 0));
    }

    #[test]
    fn test_refresh_spanning_modules() {
        let (mut driver, log) = chain(4, false);
        driver.refresh(6..18).unwrap();

        let tx = transactions(&log);
        for words in &tx {
            assert_ne!(words[0][0], reg::NOOP);
            assert_ne!(words[1][0], reg::NOOP);
            assert_ne!(words[2][0], reg::NOOP);
            assert_eq!(words[3], [reg::NOOP, 0]);
        }
    }

    #[test]
    fn test_reverse_columns() {
        let (mut driver, log) = chain(1, true);
        driver.set_column(0, 0x80).unwrap();
        driver.refresh(0..8).unwrap();

        let tx = transactions(&log);
        assert_eq!(tx[7][0], [reg::DIGIT0 + 7, 0x01]);

        let (mut driver, log) = chain(1, false);
        driver.set_column(0, 0x80).unwrap();
        driver.refresh(0..8).unwrap();
        assert_eq!(transactions(&log)[7][0], [reg::DIGIT0 + 7, 0x80]);
    }

    #[test]
    fn test_refresh_range_checked() {
        let (mut driver, log) = chain(2, false);
        assert_eq!(driver.refresh(0..17), Err(DisplayError::OutOfRange));
        assert!(driver.refresh(4..4).is_ok());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_spi_error_releases_load() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let spi = MockSpi {
            log: log.clone(),
            fail: true,
        };
        let pin = MockPin {
            log: log.clone(),
            high: true,
        };
        let mut driver: Max7219<_, _, 4> = Max7219::new(spi, pin, Max7219Config::default());

        assert_eq!(driver.refresh(0..8), Err(DisplayError::Communication));
        assert_eq!(log.borrow().last(), Some(&Event::High));
    }

    #[test]
    fn test_device_count_clamped() {
        let (driver, _) = chain(0, false);
        assert_eq!(driver.devices(), 1);
        let (driver, _) = chain(40, false);
        assert_eq!(driver.devices(), 8);
    }
}
