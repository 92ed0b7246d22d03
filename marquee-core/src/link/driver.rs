//! Async link driver
//!
//! Executes supervisor actions against a [`Transport`]. One call to
//! [`LinkDriver::service`] is one supervisor iteration; callers decide how
//! long to idle between iterations.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use super::state::{LinkState, Transition};
use super::supervisor::{Action, LinkConfig, Supervisor};
use crate::traits::{Clock, Transport};

/// Result of one service iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Nothing changed
    Idle,
    /// The link changed state
    Changed(Transition),
    /// Provisioning must run before the supervisor can continue
    NeedsReconfiguration,
    /// The transport failed with the given fatal code
    Fatal(u8),
}

/// Drives a [`Supervisor`] over a transport and a clock
pub struct LinkDriver<T: Transport, C: Clock> {
    transport: T,
    clock: C,
}

impl<T: Transport, C: Clock> LinkDriver<T, C> {
    /// Create a driver
    pub fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    /// Run one supervisor iteration
    ///
    /// A `trigger` that fires while a connect attempt is in flight cancels
    /// the attempt: the connect future is dropped, the transport is torn
    /// down and the supervisor enters `Reconfiguring`.
    pub async fn service<M: RawMutex>(
        &mut self,
        supervisor: &mut Supervisor,
        trigger: &Signal<M, ()>,
    ) -> Outcome {
        let from = supervisor.state();

        let action = if trigger.try_take().is_some() {
            supervisor.request_reconfigure();
            None
        } else {
            let now = self.clock.now_ms();
            supervisor.poll(now, self.transport.is_connected())
        };

        match action {
            Some(Action::Connect) => {
                match select(self.transport.connect(), trigger.wait()).await {
                    Either::First(result) => {
                        supervisor.on_connect(self.clock.now_ms(), result);
                    }
                    Either::Second(()) => {
                        supervisor.request_reconfigure();
                    }
                }
            }
            Some(Action::Ping) => {
                let alive = self.transport.ping().await;
                supervisor.on_ping(self.clock.now_ms(), alive);
            }
            Some(Action::Reconfigure) | None => {}
        }

        let to = supervisor.state();
        if from != to && (from == LinkState::Connected || to == LinkState::Reconfiguring) {
            self.transport.disconnect().await;
        }

        match to {
            LinkState::Reconfiguring => Outcome::NeedsReconfiguration,
            LinkState::Faulted => Outcome::Fatal(supervisor.fault_code().unwrap_or_default()),
            _ if from != to => Outcome::Changed(Transition { from, to }),
            _ => Outcome::Idle,
        }
    }

    /// Leave `Reconfiguring` with fresh settings
    ///
    /// Trigger presses that arrived while provisioning ran are discarded;
    /// they belong to the round that just finished.
    pub fn restart<M: RawMutex>(
        &mut self,
        supervisor: &mut Supervisor,
        config: LinkConfig,
        trigger: &Signal<M, ()>,
    ) -> Option<Transition> {
        trigger.reset();
        supervisor.restart(config)
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably (for provisioning between restarts)
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::supervisor::{LinkConfig, DEFAULT_PING_INTERVAL_MS, DEFAULT_RETRY_CEILING};
    use crate::traits::ConnectError;
    use core::cell::Cell;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type Trigger = Signal<NoopRawMutex, ()>;

    struct FakeClock<'a>(&'a Cell<u64>);

    impl Clock for FakeClock<'_> {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct FakeTransport<'a> {
        results: Vec<Result<(), ConnectError>>,
        pings: Vec<bool>,
        connected: bool,
        connects: usize,
        disconnects: usize,
        hang_and_fire: Option<&'a Trigger>,
    }

    impl Transport for FakeTransport<'_> {
        async fn connect(&mut self) -> Result<(), ConnectError> {
            self.connects += 1;
            if let Some(trigger) = self.hang_and_fire {
                trigger.signal(());
                core::future::pending::<()>().await;
            }
            let result = if self.results.is_empty() {
                Ok(())
            } else {
                self.results.remove(0)
            };
            self.connected = result.is_ok();
            result
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn ping(&mut self) -> bool {
            let alive = if self.pings.is_empty() {
                true
            } else {
                self.pings.remove(0)
            };
            self.connected = alive;
            alive
        }

        async fn disconnect(&mut self) {
            self.disconnects += 1;
            self.connected = false;
        }
    }

    #[test]
    fn test_connect_success() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let mut driver = LinkDriver::new(FakeTransport::default(), FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                from: LinkState::Disconnected,
                to: LinkState::Connecting
            })
        );
        assert_eq!(driver.transport().connects, 0);

        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                from: LinkState::Connecting,
                to: LinkState::Connected
            })
        );
        assert_eq!(driver.transport().connects, 1);
        assert_eq!(block_on(driver.service(&mut sup, &trigger)), Outcome::Idle);
    }

    #[test]
    fn test_retry_exhaustion_needs_reconfiguration() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let transport = FakeTransport {
            results: vec![Err(ConnectError::Transient(3)); 16],
            ..Default::default()
        };
        let mut driver = LinkDriver::new(transport, FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        let mut outcomes = Vec::new();
        for _ in 0..=DEFAULT_RETRY_CEILING {
            outcomes.push(block_on(driver.service(&mut sup, &trigger)));
            time.set(time.get() + 500);
        }

        assert_eq!(driver.transport().connects, DEFAULT_RETRY_CEILING as usize);
        assert!(matches!(outcomes[0], Outcome::Changed(_)));
        assert_eq!(outcomes.last(), Some(&Outcome::NeedsReconfiguration));
        assert!(outcomes[1..outcomes.len() - 1]
            .iter()
            .all(|o| *o == Outcome::Idle));
        assert_eq!(driver.transport().disconnects, 1);
    }

    #[test]
    fn test_retry_delay_skips_attempts() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let transport = FakeTransport {
            results: vec![Err(ConnectError::Transient(3)); 4],
            ..Default::default()
        };
        let mut driver = LinkDriver::new(transport, FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        block_on(driver.service(&mut sup, &trigger));
        block_on(driver.service(&mut sup, &trigger));
        time.set(100);
        block_on(driver.service(&mut sup, &trigger));
        assert_eq!(driver.transport().connects, 1);
    }

    #[test]
    fn test_trigger_cancels_connect() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let transport = FakeTransport {
            hang_and_fire: Some(&trigger),
            ..Default::default()
        };
        let mut driver = LinkDriver::new(transport, FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        block_on(driver.service(&mut sup, &trigger));
        let outcome = block_on(driver.service(&mut sup, &trigger));
        assert_eq!(outcome, Outcome::NeedsReconfiguration);
        assert_eq!(sup.state(), LinkState::Reconfiguring);
        assert_eq!(driver.transport().connects, 1);
        assert_eq!(driver.transport().disconnects, 1);
        assert!(!driver.transport().is_connected());
    }

    #[test]
    fn test_pending_trigger_skips_connect() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let mut driver = LinkDriver::new(FakeTransport::default(), FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        trigger.signal(());
        let outcome = block_on(driver.service(&mut sup, &trigger));
        assert_eq!(outcome, Outcome::NeedsReconfiguration);
        assert_eq!(driver.transport().connects, 0);

        // Stays there until restarted
        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::NeedsReconfiguration
        );
        driver.restart(&mut sup, LinkConfig::default(), &trigger);
        assert!(matches!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(_)
        ));
    }

    #[test]
    fn test_press_during_provisioning_not_replayed() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let mut driver = LinkDriver::new(FakeTransport::default(), FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        trigger.signal(());
        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::NeedsReconfiguration
        );

        // Operator presses again while the portal is open
        trigger.signal(());
        driver.restart(&mut sup, LinkConfig::default(), &trigger);

        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                from: LinkState::Disconnected,
                to: LinkState::Connecting
            })
        );
        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                from: LinkState::Connecting,
                to: LinkState::Connected
            })
        );
        assert_eq!(driver.transport().connects, 1);
    }

    #[test]
    fn test_one_transition_per_iteration() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let transport = FakeTransport {
            pings: vec![false],
            ..Default::default()
        };
        let mut driver = LinkDriver::new(transport, FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        let mut seen = Vec::new();
        for step in 0..8u64 {
            time.set(step * DEFAULT_PING_INTERVAL_MS as u64);
            if let Outcome::Changed(t) = block_on(driver.service(&mut sup, &trigger)) {
                seen.push((t.from, t.to));
            }
        }

        use LinkState::*;
        assert_eq!(
            &seen[..5],
            &[
                (Disconnected, Connecting),
                (Connecting, Connected),
                (Connected, Disconnected),
                (Disconnected, Connecting),
                (Connecting, Connected),
            ]
        );
    }

    #[test]
    fn test_fatal_reported() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let transport = FakeTransport {
            results: vec![Err(ConnectError::Fatal(0x90))],
            ..Default::default()
        };
        let mut driver = LinkDriver::new(transport, FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                from: LinkState::Disconnected,
                to: LinkState::Connecting
            })
        );
        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Fatal(0x90)
        );
        time.set(60_000);
        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Fatal(0x90)
        );
        assert_eq!(driver.transport().connects, 1);
    }

    #[test]
    fn test_failed_ping_disconnects() {
        let time = Cell::new(0);
        let trigger = Trigger::new();
        let transport = FakeTransport {
            pings: vec![true, false],
            ..Default::default()
        };
        let mut driver = LinkDriver::new(transport, FakeClock(&time));
        let mut sup = Supervisor::new(LinkConfig::default());

        block_on(driver.service(&mut sup, &trigger));
        block_on(driver.service(&mut sup, &trigger));
        time.set(DEFAULT_PING_INTERVAL_MS as u64);
        assert_eq!(block_on(driver.service(&mut sup, &trigger)), Outcome::Idle);

        time.set(2 * DEFAULT_PING_INTERVAL_MS as u64);
        assert_eq!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                from: LinkState::Connected,
                to: LinkState::Disconnected
            })
        );
        assert_eq!(driver.transport().disconnects, 1);

        // Reconnects rather than reconfiguring
        assert!(matches!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                to: LinkState::Connecting,
                ..
            })
        ));
        assert!(matches!(
            block_on(driver.service(&mut sup, &trigger)),
            Outcome::Changed(Transition {
                to: LinkState::Connected,
                ..
            })
        ));
    }
}
