//! Connectivity supervision
//!
//! [`Supervisor`] decides what to do with the network link based on its
//! state, elapsed time and reported results. It performs no I/O and reads no
//! clock. [`LinkDriver`] is the async glue that executes its actions against
//! a [`Transport`](crate::traits::Transport).

pub mod driver;
pub mod state;
pub mod supervisor;

pub use driver::{LinkDriver, Outcome};
pub use state::{LinkEvent, LinkState, Transition};
pub use supervisor::{
    Action, LinkConfig, Supervisor, DEFAULT_PING_INTERVAL_MS, DEFAULT_RETRY_CEILING,
    DEFAULT_RETRY_DELAY_MS, MAX_RETRY_CEILING, MIN_RETRY_CEILING, TIME_UNIT_MS,
};
