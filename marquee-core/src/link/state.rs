//! Link state machine definition

/// Link states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No session; a connect attempt starts on the next poll
    Disconnected,
    /// Connect attempts in progress
    Connecting,
    /// Session established; liveness is probed periodically
    Connected,
    /// Credentials must be re-acquired; left only through a restart
    Reconfiguring,
    /// Unrecoverable transport fault; requires a full reset
    Faulted,
}

/// Inputs to the link state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Supervisor polled
    Tick,
    /// Transport reported a successful connect
    ConnectOk,
    /// Transient connect failure, ceiling not yet reached
    ConnectFailed,
    /// Transient connect failure that reached the retry ceiling
    RetriesExhausted,
    /// Fatal connect failure
    ConnectFatal,
    /// Liveness probe failed
    PingFailed,
    /// Transport reports the session is gone
    LinkLost,
    /// Operator asked for reconfiguration
    ManualTrigger,
    /// Fresh settings installed
    Restart,
}

impl LinkState {
    /// Check if the supervisor can make further progress on its own
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkState::Reconfiguring | LinkState::Faulted)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Faulted, _) => Faulted,

            (Disconnected, Tick) => Connecting,

            (Connecting, ConnectOk) => Connected,
            (Connecting, ConnectFailed) => Connecting,
            (Connecting, RetriesExhausted) => Reconfiguring,
            (Connecting, ConnectFatal) => Faulted,

            // Never straight to Reconfiguring
            (Connected, PingFailed) => Disconnected,
            (Connected, LinkLost) => Disconnected,

            (Disconnected | Connecting | Connected, ManualTrigger) => Reconfiguring,

            (_, Restart) => Disconnected,

            (state, _) => state,
        }
    }
}

/// A state change, reported for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    /// State before
    pub from: LinkState,
    /// State after
    pub to: LinkState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_flow() {
        let state = LinkState::Disconnected
            .transition(LinkEvent::Tick)
            .transition(LinkEvent::ConnectFailed);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(state.transition(LinkEvent::ConnectOk), LinkState::Connected);
    }

    #[test]
    fn test_ping_failure_disconnects() {
        assert_eq!(
            LinkState::Connected.transition(LinkEvent::PingFailed),
            LinkState::Disconnected
        );
        assert_eq!(
            LinkState::Connected.transition(LinkEvent::LinkLost),
            LinkState::Disconnected
        );
    }

    #[test]
    fn test_manual_trigger_from_live_states() {
        for state in [
            LinkState::Disconnected,
            LinkState::Connecting,
            LinkState::Connected,
        ] {
            assert_eq!(
                state.transition(LinkEvent::ManualTrigger),
                LinkState::Reconfiguring
            );
        }
    }

    #[test]
    fn test_faulted_absorbs_everything() {
        for event in [
            LinkEvent::Tick,
            LinkEvent::ConnectOk,
            LinkEvent::ManualTrigger,
            LinkEvent::Restart,
        ] {
            assert_eq!(LinkState::Faulted.transition(event), LinkState::Faulted);
        }
    }

    #[test]
    fn test_reconfiguring_left_only_by_restart() {
        assert_eq!(
            LinkState::Reconfiguring.transition(LinkEvent::Tick),
            LinkState::Reconfiguring
        );
        assert_eq!(
            LinkState::Reconfiguring.transition(LinkEvent::ConnectOk),
            LinkState::Reconfiguring
        );
        assert_eq!(
            LinkState::Reconfiguring.transition(LinkEvent::Restart),
            LinkState::Disconnected
        );
    }

    #[test]
    fn test_irrelevant_events_ignored() {
        assert_eq!(
            LinkState::Connected.transition(LinkEvent::Tick),
            LinkState::Connected
        );
        assert_eq!(
            LinkState::Disconnected.transition(LinkEvent::PingFailed),
            LinkState::Disconnected
        );
    }
}
