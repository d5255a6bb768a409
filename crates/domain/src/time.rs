//! Monotonic tick arithmetic.
//!
//! A [`Tick`] is a wrapping millisecond counter, the same shape as a
//! microcontroller's `millis()`. All comparisons go through [`elapsed`] so
//! that a counter wrap never stalls a timer.

/// Monotonic tick value (milliseconds, wrapping at `u32::MAX`).
pub type Tick = u32;

/// Ticks elapsed from `since` to `now`, tolerant to a single wrap.
#[must_use]
pub fn elapsed(now: Tick, since: Tick) -> Tick {
    now.wrapping_sub(since)
}

/// Whether at least `interval` ticks have passed between `since` and `now`.
#[must_use]
pub fn has_elapsed(now: Tick, since: Tick, interval: Tick) -> bool {
    elapsed(now, since) >= interval
}
