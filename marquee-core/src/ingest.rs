//! Message ingestion
//!
//! Entry point for payloads arriving from the messaging transport. There is
//! no backpressure: the only feedback to the sender is whether this call
//! accepted the payload.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::message::{Mailbox, MAX_MESSAGE_LEN};

/// Ingestion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IngestError {
    /// Payload exceeds [`MAX_MESSAGE_LEN`]
    TooLong,
}

/// Counters kept by an [`Ingestor`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IngestStats {
    /// Payloads published to the mailbox
    pub accepted: u32,
    /// Payloads rejected as too long
    pub rejected: u32,
    /// Accepted payloads that replaced a message nobody had displayed yet
    pub replaced: u32,
}

/// Strip line terminators and C string padding from the end of a payload
pub fn trim_payload(payload: &[u8]) -> &[u8] {
    let mut end = payload.len();
    while end > 0 && matches!(payload[end - 1], b'\0' | b'\r' | b'\n') {
        end -= 1;
    }
    &payload[..end]
}

/// Writes inbound payloads into the renderer's mailbox
pub struct Ingestor<'a, M: RawMutex> {
    mailbox: &'a Mailbox<M>,
    stats: IngestStats,
}

impl<'a, M: RawMutex> Ingestor<'a, M> {
    /// Create an ingestor feeding `mailbox`
    pub fn new(mailbox: &'a Mailbox<M>) -> Self {
        Self {
            mailbox,
            stats: IngestStats::default(),
        }
    }

    /// Deliver a payload
    ///
    /// Overwriting an unconsumed message is accepted data loss and is only
    /// reflected in [`IngestStats::replaced`].
    pub fn deliver(&mut self, payload: &[u8]) -> Result<(), IngestError> {
        let payload = trim_payload(payload);
        if payload.len() > MAX_MESSAGE_LEN {
            self.stats.rejected = self.stats.rejected.saturating_add(1);
            return Err(IngestError::TooLong);
        }

        let replacing = self.mailbox.has_pending();
        self.mailbox.deliver(payload)?;

        self.stats.accepted = self.stats.accepted.saturating_add(1);
        if replacing {
            self.stats.replaced = self.stats.replaced.saturating_add(1);
        }
        Ok(())
    }

    /// Counters since creation
    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}
