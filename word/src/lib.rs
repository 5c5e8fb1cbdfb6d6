//! a 32-bit atomic word with blocking wait/wake semantics.
//!
//! this crate provides [`WaitWord`], the minimal primitive the ward locks
//! are built from: a plain `AtomicU32` extended with the ability to put the
//! calling thread to sleep until the value changes, without spinning.
//!
//! # backends
//!
//! one backend is compiled in per target, selected at build time:
//!
//! - **linux**: `futex(2)` wait/wake (`FUTEX_WAIT` / `FUTEX_WAKE`, private)
//! - **windows**: `WaitOnAddress` / `WakeByAddress*`
//!
//! # contract
//!
//! - `wait*` blocks only while the observed value still equals the expected
//!   value, and may return spuriously at any time
//! - wakes are best-effort; every call site must re-check its condition in
//!   a loop
//! - timed waits signal timeout with `false`, never an error
//!
//! # example
//!
//! ```
//! use ward_word::WaitWord;
//! use std::sync::atomic::Ordering;
//!
//! let word = WaitWord::new(0);
//! word.fetch_add(1, Ordering::AcqRel);
//!
//! // returns immediately: the current value no longer equals 0
//! word.wait(0);
//! assert_eq!(word.load(Ordering::Acquire), 1);
//! ```

#![warn(rust_2018_idioms)]

mod sys;
mod word;

pub use word::WaitWord;
