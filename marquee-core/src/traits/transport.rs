//! Messaging transport
//!
//! The transport owns the network session (Wi-Fi association, broker
//! session, TLS). Inbound messages do not pass through this trait; they are
//! delivered to ingestion by whoever receives them.

use core::future::Future;

/// Connect failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectError {
    /// Worth retrying (broker unreachable, association failed, timeout)
    Transient(u8),
    /// Hardware or driver level fault; retrying cannot help
    Fatal(u8),
}

/// First result code treated as fatal
pub const FATAL_CODE_BASE: u8 = 0x80;

impl ConnectError {
    /// Classify a transport result code (0 = success)
    pub fn from_code(code: u8) -> Result<(), ConnectError> {
        match code {
            0 => Ok(()),
            c if c >= FATAL_CODE_BASE => Err(ConnectError::Fatal(c)),
            c => Err(ConnectError::Transient(c)),
        }
    }

    /// Raw result code
    pub fn code(&self) -> u8 {
        match self {
            ConnectError::Transient(c) | ConnectError::Fatal(c) => *c,
        }
    }

    /// Check if this error ends the supervisor
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConnectError::Fatal(_))
    }
}

/// Network transport used by the link supervisor
pub trait Transport {
    /// Establish the session
    fn connect(&mut self) -> impl Future<Output = Result<(), ConnectError>>;

    /// Last known session state
    fn is_connected(&self) -> bool;

    /// Liveness probe over the established session
    fn ping(&mut self) -> impl Future<Output = bool>;

    /// Tear the session down (idempotent)
    fn disconnect(&mut self) -> impl Future<Output = ()>;
}
