//! object guard: one value, one lock, scope-bound typed accessors.
//!
//! [`Guarded<T, L>`] owns a value of type `T` and a lock of type `L`
//! (anything implementing `ward_traits::ShareLock`). the value can only be
//! reached through a guard handle, which holds the corresponding lock mode
//! for exactly its own lifetime:
//!
//! - [`MutGuard`]: exclusive mode, mutable view
//! - [`ConstGuard`]: exclusive mode, immutable view
//! - [`SharedGuard`]: shared mode, immutable view
//!
//! the conversion matrix is deliberately narrow: a `MutGuard` can move into
//! a `ConstGuard` without touching the lock ([`MutGuard::into_const`]), a
//! `SharedGuard` can be cloned (which re-acquires shared access in full),
//! and nothing else converts.
//!
//! # example
//!
//! ```
//! use ward_guard::Guarded;
//! use ward_rwlock::RwLock;
//!
//! let counter: Guarded<u64, RwLock> = Guarded::new(0);
//!
//! *counter.lock() += 1;
//! assert_eq!(*counter.lock_shared(), 1);
//! assert!(counter.try_lock().is_some());
//! ```

#![warn(rust_2018_idioms)]

mod guarded;

pub use guarded::{ConstGuard, Guarded, MutGuard, SharedGuard};
pub use ward_traits::{ShareLock, TimedShareLock};
