//! Sans-I/O connectivity supervisor
//!
//! The caller polls with the current time and the transport's view of the
//! session, performs the returned [`Action`], and reports the result back.
//! Exactly one action is outstanding at a time.

use super::state::{LinkEvent, LinkState, Transition};
use crate::traits::ConnectError;

/// Design time unit
pub const TIME_UNIT_MS: u32 = 50;

/// Delay between connect attempts (10 units)
pub const DEFAULT_RETRY_DELAY_MS: u32 = 10 * TIME_UNIT_MS;

/// Liveness probe interval while connected (350 units)
pub const DEFAULT_PING_INTERVAL_MS: u32 = 350 * TIME_UNIT_MS;

/// Lowest accepted retry ceiling
pub const MIN_RETRY_CEILING: u8 = 3;

/// Highest accepted retry ceiling
pub const MAX_RETRY_CEILING: u8 = 11;

/// Retry ceiling used when none is configured
pub const DEFAULT_RETRY_CEILING: u8 = 5;

/// Supervisor timing and escalation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    retry_ceiling: u8,
    retry_delay_ms: u32,
    ping_interval_ms: u32,
}

impl LinkConfig {
    /// Create a config; the ceiling is clamped to
    /// `MIN_RETRY_CEILING..=MAX_RETRY_CEILING`
    pub const fn new(retry_ceiling: u8, retry_delay_ms: u32, ping_interval_ms: u32) -> Self {
        let retry_ceiling = if retry_ceiling < MIN_RETRY_CEILING {
            MIN_RETRY_CEILING
        } else if retry_ceiling > MAX_RETRY_CEILING {
            MAX_RETRY_CEILING
        } else {
            retry_ceiling
        };
        Self {
            retry_ceiling,
            retry_delay_ms,
            ping_interval_ms,
        }
    }

    /// Consecutive transient failures that force reconfiguration
    pub fn retry_ceiling(&self) -> u8 {
        self.retry_ceiling
    }

    /// Minimum time between a failed attempt and the next one
    pub fn retry_delay_ms(&self) -> u32 {
        self.retry_delay_ms
    }

    /// Time between liveness probes
    pub fn ping_interval_ms(&self) -> u32 {
        self.ping_interval_ms
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_CEILING,
            DEFAULT_RETRY_DELAY_MS,
            DEFAULT_PING_INTERVAL_MS,
        )
    }
}

/// Work requested from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Start a connect attempt, then call [`Supervisor::on_connect`]
    Connect,
    /// Probe liveness, then call [`Supervisor::on_ping`]
    Ping,
    /// Run provisioning, then call [`Supervisor::restart`]
    Reconfigure,
}

/// Connectivity supervisor
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: LinkConfig,
    state: LinkState,
    retries: u8,
    in_flight: bool,
    last_attempt_ms: Option<u64>,
    last_ping_ms: u64,
    last_error: Option<ConnectError>,
    connects: u32,
}

impl Supervisor {
    /// Create a supervisor in `Disconnected`
    pub const fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: LinkState::Disconnected,
            retries: 0,
            in_flight: false,
            last_attempt_ms: None,
            last_ping_ms: 0,
            last_error: None,
            connects: 0,
        }
    }

    /// Decide the next action at `now_ms`
    ///
    /// `link_up` is the transport's own view of the session; losing it while
    /// connected counts as a disconnect. Leaving `Disconnected` is a poll of
    /// its own, so no poll crosses more than one state.
    pub fn poll(&mut self, now_ms: u64, link_up: bool) -> Option<Action> {
        match self.state {
            LinkState::Disconnected => {
                self.apply(LinkEvent::Tick);
                None
            }
            LinkState::Connecting => self.try_connect(now_ms),
            LinkState::Connected => {
                if self.in_flight {
                    return None;
                }
                if !link_up {
                    self.last_attempt_ms = None;
                    self.apply(LinkEvent::LinkLost);
                    return None;
                }
                let elapsed = now_ms.saturating_sub(self.last_ping_ms);
                if elapsed >= self.config.ping_interval_ms as u64 {
                    self.in_flight = true;
                    self.last_ping_ms = now_ms;
                    Some(Action::Ping)
                } else {
                    None
                }
            }
            LinkState::Reconfiguring => Some(Action::Reconfigure),
            LinkState::Faulted => None,
        }
    }

    fn try_connect(&mut self, now_ms: u64) -> Option<Action> {
        if self.in_flight {
            return None;
        }
        let ready = match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.retry_delay_ms as u64,
        };
        if !ready {
            return None;
        }
        self.in_flight = true;
        self.last_attempt_ms = Some(now_ms);
        Some(Action::Connect)
    }

    /// Report the result of a [`Action::Connect`]
    ///
    /// Results arriving after the attempt was cancelled are ignored.
    pub fn on_connect(
        &mut self,
        now_ms: u64,
        result: Result<(), ConnectError>,
    ) -> Option<Transition> {
        if self.state != LinkState::Connecting || !self.in_flight {
            return None;
        }
        self.in_flight = false;

        match result {
            Ok(()) => {
                self.retries = 0;
                self.last_ping_ms = now_ms;
                self.connects = self.connects.wrapping_add(1);
                self.apply(LinkEvent::ConnectOk)
            }
            Err(err @ ConnectError::Transient(_)) => {
                self.last_error = Some(err);
                self.last_attempt_ms = Some(now_ms);
                self.retries = self.retries.saturating_add(1);
                if self.retries >= self.config.retry_ceiling {
                    self.retries = 0;
                    self.apply(LinkEvent::RetriesExhausted)
                } else {
                    self.apply(LinkEvent::ConnectFailed)
                }
            }
            Err(err @ ConnectError::Fatal(_)) => {
                self.last_error = Some(err);
                self.apply(LinkEvent::ConnectFatal)
            }
        }
    }

    /// Report the result of an [`Action::Ping`]
    pub fn on_ping(&mut self, now_ms: u64, alive: bool) -> Option<Transition> {
        if self.state != LinkState::Connected || !self.in_flight {
            return None;
        }
        self.in_flight = false;

        if alive {
            self.last_ping_ms = now_ms;
            None
        } else {
            self.last_attempt_ms = None;
            self.apply(LinkEvent::PingFailed)
        }
    }

    /// Operator-issued reconfiguration, bypassing the retry ceiling
    ///
    /// Any outstanding action is abandoned.
    pub fn request_reconfigure(&mut self) -> Option<Transition> {
        if self.state.is_terminal() {
            return None;
        }
        self.in_flight = false;
        self.retries = 0;
        self.apply(LinkEvent::ManualTrigger)
    }

    /// Start over in `Disconnected` with refreshed settings
    ///
    /// A faulted supervisor stays faulted.
    pub fn restart(&mut self, config: LinkConfig) -> Option<Transition> {
        if self.state == LinkState::Faulted {
            return None;
        }
        self.config = config;
        self.retries = 0;
        self.in_flight = false;
        self.last_attempt_ms = None;
        self.last_ping_ms = 0;
        self.apply(LinkEvent::Restart)
    }

    fn apply(&mut self, event: LinkEvent) -> Option<Transition> {
        let from = self.state;
        let to = from.transition(event);
        self.state = to;
        (from != to).then_some(Transition { from, to })
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Consecutive transient failures since the last success or escalation
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Active parameters
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Most recent connect failure
    pub fn last_error(&self) -> Option<ConnectError> {
        self.last_error
    }

    /// Fault code once `Faulted`
    pub fn fault_code(&self) -> Option<u8> {
        match (self.state, self.last_error) {
            (LinkState::Faulted, Some(err)) => Some(err.code()),
            _ => None,
        }
    }

    /// Successful connects since creation (wraps)
    pub fn connects(&self) -> u32 {
        self.connects
    }
}
