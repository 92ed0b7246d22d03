//! UART transport to the coprocessor

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use portable_atomic::Ordering;

use marquee_core::config::{BrokerSettings, LinkSettings, PortalSettings};
use marquee_core::traits::{ConnectError, Transport};
use marquee_protocol::{FrameError, Request, MAX_FRAME_SIZE};

use crate::channels::{LinkReply, LINK_UP, REPLY_CHANNEL};
use crate::config::ConfigError;

/// Transient code reported when the coprocessor does not answer a connect
const CODE_NO_ANSWER: u8 = 0x7F;

/// Transient code reported when the request could not be sent
const CODE_SEND_FAILED: u8 = 0x7E;

/// Extra time granted past the portal's own timeout
const PORTAL_MARGIN: Duration = Duration::from_secs(30);

/// Coprocessor link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Request could not be framed
    Frame(FrameError),
    /// UART write failed
    Uart,
}

impl From<FrameError> for LinkError {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

/// Request/reply client for the coprocessor
pub struct CoprocessorLink {
    tx: BufferedUartTx,
    connect_timeout: Duration,
    ping_timeout: Duration,
}

impl CoprocessorLink {
    pub fn new(tx: BufferedUartTx, settings: &LinkSettings) -> Self {
        Self {
            tx,
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms as u64),
            ping_timeout: Duration::from_millis(settings.ping_timeout_ms as u64),
        }
    }

    /// Apply new timeouts after settings changed
    pub fn set_timeouts(&mut self, settings: &LinkSettings) {
        self.connect_timeout = Duration::from_millis(settings.connect_timeout_ms as u64);
        self.ping_timeout = Duration::from_millis(settings.ping_timeout_ms as u64);
    }

    /// Install broker settings on the coprocessor
    pub async fn configure(&mut self, broker: &BrokerSettings) -> Result<(), LinkError> {
        self.send(&Request::Configure(broker)).await
    }

    /// Run the provisioning portal and wait for new broker settings
    ///
    /// Fails with [`ConfigError::Timeout`] when the portal closes without
    /// input or the coprocessor stops answering.
    pub async fn run_portal(
        &mut self,
        portal: &PortalSettings,
        defaults: &BrokerSettings,
    ) -> Result<BrokerSettings, ConfigError> {
        self.discard_replies();
        self.send(&Request::ConfigurePortal(portal)).await?;
        self.send(&Request::StartPortal {
            timeout_s: portal.timeout_s,
            defaults,
        })
        .await?;

        info!(
            "Portal open on access point \"{}\" for {} s",
            portal.ap_name.as_str(),
            portal.timeout_s
        );

        let limit = Duration::from_secs(portal.timeout_s as u64) + PORTAL_MARGIN;
        let wait = async {
            loop {
                match REPLY_CHANNEL.receive().await {
                    LinkReply::PortalComplete(broker) => return Ok(broker),
                    LinkReply::PortalTimeout => return Err(ConfigError::Timeout),
                    other => debug!("Ignoring reply during portal: {:?}", other),
                }
            }
        };

        with_timeout(limit, wait)
            .await
            .unwrap_or(Err(ConfigError::Timeout))
    }

    async fn send(&mut self, request: &Request<'_>) -> Result<(), LinkError> {
        let frame = request.to_frame()?;
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = frame.encode(&mut buf)?;

        if let Err(e) = self.tx.write_all(&buf[..len]).await {
            warn!("UART write failed: {:?}", e);
            return Err(LinkError::Uart);
        }
        trace!("TX type {=u8:#x}, {} bytes", frame.msg_type, len);
        Ok(())
    }

    /// Drop replies left over from an abandoned request
    fn discard_replies(&self) {
        while let Ok(stale) = REPLY_CHANNEL.try_receive() {
            debug!("Discarding stale reply {:?}", stale);
        }
    }
}

impl Transport for CoprocessorLink {
    async fn connect(&mut self) -> Result<(), ConnectError> {
        self.discard_replies();
        if self.send(&Request::Connect).await.is_err() {
            return Err(ConnectError::Transient(CODE_SEND_FAILED));
        }

        let wait = async {
            loop {
                match REPLY_CHANNEL.receive().await {
                    LinkReply::ConnectResult(code) => return code,
                    other => debug!("Ignoring reply during connect: {:?}", other),
                }
            }
        };

        match with_timeout(self.connect_timeout, wait).await {
            Ok(code) => ConnectError::from_code(code),
            Err(_) => {
                warn!("Connect timed out");
                Err(ConnectError::Transient(CODE_NO_ANSWER))
            }
        }
    }

    fn is_connected(&self) -> bool {
        LINK_UP.load(Ordering::Relaxed)
    }

    async fn ping(&mut self) -> bool {
        self.discard_replies();
        if self.send(&Request::Ping).await.is_err() {
            return false;
        }

        let wait = async {
            loop {
                match REPLY_CHANNEL.receive().await {
                    LinkReply::Pong(alive) => return alive,
                    other => debug!("Ignoring reply during ping: {:?}", other),
                }
            }
        };

        with_timeout(self.ping_timeout, wait).await.unwrap_or(false)
    }

    async fn disconnect(&mut self) {
        LINK_UP.store(false, Ordering::Relaxed);
        if self.send(&Request::Disconnect).await.is_err() {
            warn!("Failed to send disconnect");
        }
    }
}
