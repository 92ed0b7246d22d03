//! Board-agnostic core logic for the LED marquee firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (display driver, transport, clock)
//! - Font lookup and the scroll renderer state machine
//! - Single-slot message mailbox and ingestion
//! - Scroll scheduling over display segments
//! - Connectivity supervisor and its async driver
//! - Settings type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod font;
pub mod ingest;
pub mod link;
pub mod message;
pub mod render;
pub mod scroll;
pub mod traits;
