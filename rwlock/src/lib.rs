//! writer-priority reader/writer lock built on blocking words.
//!
//! this crate provides [`RwLock`], a shared/exclusive lock implemented
//! directly on two 32-bit atomic words with futex-style blocking. there is
//! no OS mutex underneath, no allocation and no poisoning.
//!
//! # characteristics
//!
//! - **writer priority**: a pending exclusive request blocks all *new*
//!   shared acquisitions immediately, so a stream of readers can never
//!   starve a writer
//! - **no thread affinity**: any thread may release what another acquired
//! - **timed acquisition**: duration- and deadline-bounded variants for
//!   both modes, with exact counter rollback on timeout
//! - **raw interface**: no guarded data; pair it with `ward_guard` for
//!   RAII access to a protected value
//!
//! # example
//!
//! ```
//! use ward_rwlock::RwLock;
//!
//! let lock = RwLock::new();
//!
//! lock.lock_shared();
//! assert!(lock.try_lock_shared()); // readers coexist
//! assert!(!lock.try_lock());       // writers do not
//! lock.unlock_shared();
//! lock.unlock_shared();
//!
//! lock.lock();
//! assert!(!lock.try_lock_shared());
//! lock.unlock();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod rwlock;

pub use rwlock::RwLock;
pub use ward_traits::{ShareLock, TimedShareLock};
