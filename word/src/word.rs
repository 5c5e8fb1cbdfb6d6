//! the blocking word.

use crate::sys;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// a 32-bit atomic word that threads can block on until it changes.
///
/// this is a plain `AtomicU32` plus the platform's wait/wake facility.
/// it carries no other state: whoever builds a lock out of it owns the
/// protocol, `WaitWord` only supplies atomic edits and parking.
///
/// # contract
///
/// `wait`, `wait_for` and `wait_until` may return spuriously. callers must
/// re-check their condition in a loop. timed waits return `false` only on
/// timeout.
pub struct WaitWord {
    value: AtomicU32,
}

impl WaitWord {
    /// create a new word with the given initial value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self {
            value: AtomicU32::new(value),
        }
    }

    /// load the current value.
    #[inline]
    pub fn load(&self, order: Ordering) -> u32 {
        self.value.load(order)
    }

    /// compare-and-swap. on failure the returned `Err` carries the value
    /// that was observed instead of `expected`.
    #[inline]
    pub fn compare_exchange(
        &self,
        expected: u32,
        new: u32,
        success: Ordering,
        failure: Ordering,
    ) -> Result<u32, u32> {
        self.value.compare_exchange(expected, new, success, failure)
    }

    /// atomically add `delta`, returning the previous value.
    #[inline]
    pub fn fetch_add(&self, delta: u32, order: Ordering) -> u32 {
        self.value.fetch_add(delta, order)
    }

    /// atomically subtract `delta`, returning the previous value.
    #[inline]
    pub fn fetch_sub(&self, delta: u32, order: Ordering) -> u32 {
        self.value.fetch_sub(delta, order)
    }

    /// block while the current value equals `expected`.
    ///
    /// returns when the value is observed to differ, or spuriously.
    #[inline]
    pub fn wait(&self, expected: u32) {
        sys::wait(&self.value, expected);
    }

    /// block while the current value equals `expected`, for at most
    /// `timeout`. returns `false` only if the timeout elapsed.
    #[inline]
    pub fn wait_for(&self, expected: u32, timeout: Duration) -> bool {
        sys::wait_timeout(&self.value, expected, timeout)
    }

    /// block while the current value equals `expected`, until `deadline`.
    /// returns `false` only if the deadline passed.
    #[inline]
    pub fn wait_until(&self, expected: u32, deadline: Instant) -> bool {
        match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) => sys::wait_timeout(&self.value, expected, remaining),
            // deadline already passed: timed out unless the value moved
            None => self.value.load(Ordering::Acquire) != expected,
        }
    }

    /// wake one thread blocked on this word, if any.
    #[inline]
    pub fn wake_one(&self) {
        sys::wake_one(&self.value);
    }

    /// wake every thread blocked on this word.
    #[inline]
    pub fn wake_all(&self) {
        sys::wake_all(&self.value);
    }
}

impl Default for WaitWord {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for WaitWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitWord")
            .field("value", &self.load(Ordering::Relaxed))
            .finish()
    }
}
