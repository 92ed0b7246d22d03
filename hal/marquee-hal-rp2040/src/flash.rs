//! Settings partition on the RP2040's XIP flash
//!
//! The top 64 KiB of a 2 MiB part hold a sequential-storage map. Replacing
//! a value appends a new item before the old one is retired, so a reset
//! mid-write leaves the previous settings readable.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use marquee_hal::flash::{FlashError, StorageKey};

/// Pico-class boards ship 2 MiB of flash
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const SETTINGS_PARTITION_SIZE: usize = 64 * 1024;
pub const SETTINGS_PARTITION_START: usize = FLASH_SIZE - SETTINGS_PARTITION_SIZE;

/// Must match the region carved out of FLASH in memory.x
pub const SETTINGS_RANGE: Range<u32> = (SETTINGS_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Largest item (key, value, map header) the map is asked to handle
const ITEM_BUFFER_SIZE: usize = 1024;

type Rp2040Flash<'d> = Flash<'d, FLASH, Async, FLASH_SIZE>;

fn storage_error<E>(error: sequential_storage::Error<E>) -> FlashError {
    match error {
        sequential_storage::Error::FullStorage => FlashError::Full,
        _ => FlashError::Storage,
    }
}

/// Key-value store over the settings partition
pub struct Rp2040FlashStorage<'d> {
    flash: Rp2040Flash<'d>,
}

impl<'d> Rp2040FlashStorage<'d> {
    /// Take the flash block; `dma` carries the async reads
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// Look up `key`, leaving the value in `scratch`
    async fn fetch<'s>(
        &mut self,
        key: StorageKey,
        scratch: &'s mut [u8],
    ) -> Result<Option<&'s [u8]>, FlashError> {
        map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            scratch,
            &key,
        )
        .await
        .map_err(storage_error)
    }
}

impl<'d> marquee_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut scratch = [0u8; ITEM_BUFFER_SIZE];
        let value = self.fetch(key, &mut scratch).await?.ok_or(FlashError::NotFound)?;

        let out = buffer
            .get_mut(..value.len())
            .ok_or(FlashError::BufferTooSmall)?;
        out.copy_from_slice(value);
        Ok(value.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let mut scratch = [0u8; ITEM_BUFFER_SIZE];
        map::store_item(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut scratch,
            &key,
            &data,
        )
        .await
        .map_err(storage_error)
    }

    async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.flash
            .erase(SETTINGS_RANGE.start, SETTINGS_RANGE.end)
            .await
            .map_err(|_| FlashError::Flash)
    }
}
