//! Coprocessor link protocol
//!
//! This crate defines the UART-based protocol between the RP2040 (display
//! controller) and the network coprocessor, which runs the broker session
//! and the provisioning portal. The MCU issues requests; the
//! coprocessor answers them and pushes inbound messages and link changes.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌──────┬────────┬──────┬─────────────┬──────┐
//! │ SYNC │ LENGTH │ TYPE │ PAYLOAD     │ CRC8 │
//! │ 1B   │ 1B     │ 1B   │ 0–255B      │ 1B   │
//! └──────┴────────┴──────┴─────────────┴──────┘
//! ```
//!
//! The operator console commands live here too; they are single bytes.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod console;
pub mod frame;
pub mod messages;

pub use console::ConsoleCommand;
pub use frame::{crc8, Frame, FrameError, FrameParser, FRAME_SYNC, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{Reply, Request};
