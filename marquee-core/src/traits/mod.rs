//! Collaborator traits
//!
//! Interfaces between the board-agnostic logic and the outside world:
//! the LED display hardware, the messaging transport and time.

pub mod clock;
pub mod display;
pub mod transport;

pub use clock::Clock;
pub use display::{DisplayDriver, DisplayError};
pub use transport::{ConnectError, Transport};
