//! Operator console commands
//!
//! The console is a byte stream (USB CDC or a debug UART). Each byte is one
//! command; anything unrecognised is ignored so line endings and stray
//! keystrokes are harmless.

/// Console commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleCommand {
    /// Enter reconfiguration now, bypassing the retry ceiling
    Reconfigure,
    /// Log a one-line status summary
    Status,
}

impl ConsoleCommand {
    /// Parse a command from one input byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'r' | b'R' => Some(ConsoleCommand::Reconfigure),
            b's' | b'S' => Some(ConsoleCommand::Status),
            _ => None,
        }
    }
}
