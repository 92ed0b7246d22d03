//! Message buffer and single-slot mailbox
//!
//! The renderer owns the message it is currently drawing. New text arrives
//! through a [`Mailbox`], which holds at most one unconsumed message: a newer
//! delivery replaces an older one that was never picked up.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::ingest::IngestError;

/// Maximum message length in bytes
pub const MAX_MESSAGE_LEN: usize = 255;

/// A bounded message, one byte per character
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    bytes: Vec<u8, MAX_MESSAGE_LEN>,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Message {
    fn format(&self, fmt: defmt::Formatter) {
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => defmt::write!(fmt, "\"{=str}\"", text),
            Err(_) => defmt::write!(fmt, "{=[u8]}", self.bytes.as_slice()),
        }
    }
}

impl Message {
    /// An empty message
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Copy `payload` into a new message
    pub fn from_bytes(payload: &[u8]) -> Result<Self, IngestError> {
        let bytes = Vec::from_slice(payload).map_err(|_| IngestError::TooLong)?;
        Ok(Self { bytes })
    }

    /// Message content
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Character at `index`, if any
    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the message has no characters
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Single-slot handoff between ingestion and the renderer
///
/// A message is fully built before it is published, so a reader can never
/// observe a partially copied payload. Publishing over an unconsumed message
/// replaces it (last write wins).
pub struct Mailbox<M: RawMutex> {
    slot: Signal<M, Message>,
}

impl<M: RawMutex> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Mailbox<M> {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Publish a payload, replacing any unconsumed message
    ///
    /// Rejected payloads leave the current slot untouched.
    pub fn deliver(&self, payload: &[u8]) -> Result<(), IngestError> {
        let message = Message::from_bytes(payload)?;
        self.post(message);
        Ok(())
    }

    /// Publish an already built message
    pub fn post(&self, message: Message) {
        self.slot.signal(message);
    }

    /// Take the pending message, leaving the slot empty
    pub fn take(&self) -> Option<Message> {
        self.slot.try_take()
    }

    /// True if a message is waiting to be consumed
    pub fn has_pending(&self) -> bool {
        self.slot.signaled()
    }
}
