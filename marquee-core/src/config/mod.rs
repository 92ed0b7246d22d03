//! Configuration types
//!
//! Board-agnostic settings stored as postcard binary data.

pub mod types;

pub use types::*;
