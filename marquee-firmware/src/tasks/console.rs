//! Operator console task
//!
//! Reads single-byte commands from the debug UART: `r` requests
//! reconfiguration, `s` logs a status line.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use marquee_protocol::ConsoleCommand;

use crate::channels::{RECONFIGURE, STATUS};

#[embassy_executor::task]
pub async fn console_task(mut rx: BufferedUartRx) {
    info!("Console task started");

    let mut buf = [0u8; 16];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    match ConsoleCommand::from_byte(byte) {
                        Some(ConsoleCommand::Reconfigure) => {
                            info!("Reconfiguration requested from console");
                            RECONFIGURE.signal(());
                        }
                        Some(ConsoleCommand::Status) => log_status(),
                        None => {}
                    }
                }
            }
            Err(e) => {
                warn!("Console read error: {:?}", e);
            }
        }
    }
}

fn log_status() {
    let (state, retries) = STATUS.link();
    let (accepted, rejected, replaced) = STATUS.ingest();
    info!(
        "Status: link {:?}, retries {}, messages accepted {} rejected {} replaced {}",
        state, retries, accepted, rejected, replaced
    );
}
