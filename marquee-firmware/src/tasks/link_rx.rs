//! Coprocessor UART receive task
//!
//! Parses frames from the coprocessor. Inbound messages go straight to the
//! mailbox, session status updates the link-up flag and everything else is
//! handed to the link task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use portable_atomic::Ordering;

use marquee_core::ingest::{IngestError, Ingestor};
use marquee_protocol::{FrameParser, Reply};

use crate::channels::{LinkReply, LINK_UP, MAILBOX, REPLY_CHANNEL, STATUS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut ingestor = Ingestor::new(&MAILBOX);
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match Reply::from_frame(&frame) {
                            Ok(reply) => handle_reply(reply, &mut ingestor),
                            Err(e) => warn!("Failed to parse reply: {:?}", e),
                        },
                        Ok(None) => {}
                        Err(e) => warn!("Frame parse error: {:?}", e),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

fn handle_reply(reply: Reply<'_>, ingestor: &mut Ingestor<'_, CriticalSectionRawMutex>) {
    let forward = match reply {
        Reply::Inbound(payload) => {
            deliver(payload, ingestor);
            return;
        }
        Reply::LinkStatus(up) => {
            debug!("Coprocessor reports session {}", if up { "up" } else { "down" });
            LINK_UP.store(up, Ordering::Relaxed);
            return;
        }
        Reply::ConnectResult(code) => {
            // The flag must be set before the link task sees the result
            LINK_UP.store(code == 0, Ordering::Relaxed);
            LinkReply::ConnectResult(code)
        }
        Reply::Pong(alive) => LinkReply::Pong(alive),
        Reply::PortalComplete(broker) => LinkReply::PortalComplete(broker),
        Reply::PortalTimeout => LinkReply::PortalTimeout,
    };

    if REPLY_CHANNEL.try_send(forward).is_err() {
        warn!("Reply channel full, dropping reply");
    }
}

fn deliver(payload: &[u8], ingestor: &mut Ingestor<'_, CriticalSectionRawMutex>) {
    let replaced_before = ingestor.stats().replaced;

    match ingestor.deliver(payload) {
        Ok(()) => {
            debug!("Message accepted ({} bytes)", payload.len());
            if ingestor.stats().replaced != replaced_before {
                info!("Replaced a message that was never displayed");
            }
        }
        Err(IngestError::TooLong) => {
            warn!("Message rejected: {} bytes is too long", payload.len());
        }
    }

    let stats = ingestor.stats();
    STATUS.set_ingest(stats.accepted, stats.rejected, stats.replaced);
}
