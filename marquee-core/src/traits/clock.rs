//! Time source

/// Monotonic millisecond clock
///
/// The link supervisor never reads time on its own; callers pass readings
/// from a `Clock` so tests can drive it with a fake one.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}
