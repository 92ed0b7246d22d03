//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in marquee-core for display hardware:
//!
//! - MAX7219 LED matrix chains (FC-16 style modules)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod display;
