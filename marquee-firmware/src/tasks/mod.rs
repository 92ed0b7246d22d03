//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod console;
pub mod link;
pub mod link_rx;
pub mod scroll;

pub use console::console_task;
pub use link::link_task;
pub use link_rx::link_rx_task;
pub use scroll::{scroll_task, Display, MAX_MODULES};
