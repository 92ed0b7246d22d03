//! Persistent key-value storage
//!
//! Values are opaque byte strings addressed by [`StorageKey`]; callers pick
//! the encoding.

/// Slot identifiers in the settings partition
///
/// The discriminant is the on-flash key byte. Never renumber a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Postcard-encoded runtime settings
    Settings = 0,
}

impl From<StorageKey> for u8 {
    fn from(key: StorageKey) -> u8 {
        key as u8
    }
}

impl TryFrom<u8> for StorageKey {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            0 => Ok(StorageKey::Settings),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Erase or program of the device failed
    Flash,
    /// Map bookkeeping failed or found inconsistent data
    Storage,
    /// No value stored under the key
    NotFound,
    /// Stored value is larger than the caller's buffer
    BufferTooSmall,
    /// No room left even after garbage collection
    Full,
}

/// Wear-levelled key-value store
///
/// A `write` must be power-safe: after a reset the key reads back as either
/// the previous value or the new one.
pub trait FlashStorage {
    /// Copy the value for `key` into `buffer` and return its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Replace the value for `key`
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Wipe the partition, dropping every key
    fn erase_all(&mut self) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Wipe the partition if `error` says its bookkeeping is broken
    ///
    /// A map that fails its own consistency checks rejects every later
    /// write, so the only way forward is an empty partition. Returns whether
    /// an erase happened.
    fn recover(
        &mut self,
        error: FlashError,
    ) -> impl core::future::Future<Output = Result<bool, FlashError>> {
        async move {
            if error != FlashError::Storage {
                return Ok(false);
            }
            self.erase_all().await?;
            Ok(true)
        }
    }
}

#[cfg(feature = "sequential-storage")]
mod map_key {
    use sequential_storage::map::{Key, SerializationError};

    use super::StorageKey;

    /// Keys are stored as their single discriminant byte
    impl Key for StorageKey {
        fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
            let slot = buffer.first_mut().ok_or(SerializationError::BufferTooSmall)?;
            *slot = u8::from(*self);
            Ok(1)
        }

        fn deserialize_from(buffer: &[u8]) -> Result<(Self, usize), SerializationError> {
            let byte = *buffer.first().ok_or(SerializationError::BufferTooSmall)?;
            let key = StorageKey::try_from(byte).map_err(|_| SerializationError::InvalidFormat)?;
            Ok((key, 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    /// Single-slot store that can be put into a broken state
    struct MemoryStore {
        value: Option<([u8; 16], usize)>,
        broken: bool,
        erases: usize,
    }

    impl MemoryStore {
        fn broken() -> Self {
            Self {
                value: None,
                broken: true,
                erases: 0,
            }
        }
    }

    impl FlashStorage for MemoryStore {
        async fn read(&mut self, _key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            if self.broken {
                return Err(FlashError::Storage);
            }
            let (data, len) = self.value.ok_or(FlashError::NotFound)?;
            buffer[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }

        async fn write(&mut self, _key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            if self.broken {
                return Err(FlashError::Storage);
            }
            let mut slot = [0u8; 16];
            slot[..data.len()].copy_from_slice(data);
            self.value = Some((slot, data.len()));
            Ok(())
        }

        async fn erase_all(&mut self) -> Result<(), FlashError> {
            self.erases += 1;
            self.broken = false;
            self.value = None;
            Ok(())
        }
    }

    #[test]
    fn test_broken_partition_wiped_and_writable() {
        let mut store = MemoryStore::broken();
        let mut buffer = [0u8; 16];

        let err = block_on(store.read(StorageKey::Settings, &mut buffer)).unwrap_err();
        assert_eq!(block_on(store.recover(err)), Ok(true));
        assert_eq!(store.erases, 1);

        block_on(store.write(StorageKey::Settings, b"abc")).unwrap();
        assert_eq!(block_on(store.read(StorageKey::Settings, &mut buffer)), Ok(3));
    }

    #[test]
    fn test_missing_value_not_wiped() {
        let mut store = MemoryStore {
            value: None,
            broken: false,
            erases: 0,
        };
        assert_eq!(block_on(store.recover(FlashError::NotFound)), Ok(false));
        assert_eq!(block_on(store.recover(FlashError::Flash)), Ok(false));
        assert_eq!(store.erases, 0);
    }

    #[test]
    fn test_settings_key_byte() {
        assert_eq!(u8::from(StorageKey::Settings), 0);
    }

    #[test]
    fn test_unknown_key_bytes_rejected() {
        assert_eq!(StorageKey::try_from(0), Ok(StorageKey::Settings));
        assert_eq!(StorageKey::try_from(1), Err(1));
        assert_eq!(StorageKey::try_from(0xFF), Err(0xFF));
    }
}
