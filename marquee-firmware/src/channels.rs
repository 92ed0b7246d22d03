//! Inter-task communication channels
//!
//! Static embassy-sync primitives shared between tasks. Every task runs on
//! the same cooperative executor, so these only hand data across `.await`
//! points.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use marquee_core::config::BrokerSettings;
use marquee_core::link::LinkState;
use marquee_core::message::Mailbox;

/// Channel capacity for coprocessor replies
const REPLY_CHANNEL_SIZE: usize = 4;

/// Replies the link task waits on, decoded by the RX task
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkReply {
    ConnectResult(u8),
    Pong(bool),
    PortalComplete(BrokerSettings),
    PortalTimeout,
}

/// Newest message for the scrolling segment
pub static MAILBOX: Mailbox<CriticalSectionRawMutex> = Mailbox::new();

/// Solicited replies from the coprocessor
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, LinkReply, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Session state last reported by the coprocessor
pub static LINK_UP: AtomicBool = AtomicBool::new(false);

/// Manual reconfiguration trigger (console)
pub static RECONFIGURE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Snapshot of link and ingestion state for the console status command
pub struct Status {
    state: AtomicU8,
    retries: AtomicU8,
    accepted: AtomicU32,
    rejected: AtomicU32,
    replaced: AtomicU32,
}

impl Status {
    const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            retries: AtomicU8::new(0),
            accepted: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
            replaced: AtomicU32::new(0),
        }
    }

    pub fn set_link(&self, state: LinkState, retries: u8) {
        self.state.store(state_code(state), Ordering::Relaxed);
        self.retries.store(retries, Ordering::Relaxed);
    }

    pub fn set_ingest(&self, accepted: u32, rejected: u32, replaced: u32) {
        self.accepted.store(accepted, Ordering::Relaxed);
        self.rejected.store(rejected, Ordering::Relaxed);
        self.replaced.store(replaced, Ordering::Relaxed);
    }

    pub fn link(&self) -> (LinkState, u8) {
        (
            state_from_code(self.state.load(Ordering::Relaxed)),
            self.retries.load(Ordering::Relaxed),
        )
    }

    pub fn ingest(&self) -> (u32, u32, u32) {
        (
            self.accepted.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
            self.replaced.load(Ordering::Relaxed),
        )
    }
}

fn state_code(state: LinkState) -> u8 {
    match state {
        LinkState::Disconnected => 0,
        LinkState::Connecting => 1,
        LinkState::Connected => 2,
        LinkState::Reconfiguring => 3,
        LinkState::Faulted => 4,
    }
}

fn state_from_code(code: u8) -> LinkState {
    match code {
        1 => LinkState::Connecting,
        2 => LinkState::Connected,
        3 => LinkState::Reconfiguring,
        4 => LinkState::Faulted,
        _ => LinkState::Disconnected,
    }
}

pub static STATUS: Status = Status::new();
