//! shared traits for ward_* crates.
//!
//! [`ShareLock`] is the capability a guard wrapper needs from a lock that
//! supports exclusive and shared modes; [`TimedShareLock`] adds
//! duration/deadline-bounded acquisition. all methods take `&self`, and a
//! lock may be released by a different thread than the one that acquired
//! it; no thread affinity is assumed anywhere.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// a lock with exclusive and shared modes.
///
/// `try_*` methods never block and report contention as `false`, never as
/// an error. unbalanced releases are a contract violation and are not
/// checked.
pub trait ShareLock: Send + Sync {
    /// block until exclusive access is acquired.
    fn lock(&self);

    /// attempt exclusive access without blocking.
    fn try_lock(&self) -> bool;

    /// release exclusive access. may be called from any thread.
    fn unlock(&self);

    /// block until shared access is acquired.
    fn lock_shared(&self);

    /// attempt shared access without blocking.
    fn try_lock_shared(&self) -> bool;

    /// release one shared hold. may be called from any thread.
    fn unlock_shared(&self);
}

/// a [`ShareLock`] with duration/deadline-bounded acquisition.
///
/// timed methods return `false` on timeout, after restoring the lock's
/// internal accounting exactly as if the attempt never started.
pub trait TimedShareLock: ShareLock {
    /// attempt exclusive access, blocking at most `timeout`.
    fn try_lock_for(&self, timeout: Duration) -> bool;

    /// attempt exclusive access, blocking until `deadline`.
    fn try_lock_until(&self, deadline: Instant) -> bool;

    /// attempt shared access, blocking at most `timeout`.
    fn try_lock_shared_for(&self, timeout: Duration) -> bool;

    /// attempt shared access, blocking until `deadline`.
    fn try_lock_shared_until(&self, deadline: Instant) -> bool;
}

/// blanket impl for references - zero cost, just forwards.
impl<L: ShareLock + ?Sized> ShareLock for &L {
    #[inline]
    fn lock(&self) {
        (**self).lock();
    }

    #[inline]
    fn try_lock(&self) -> bool {
        (**self).try_lock()
    }

    #[inline]
    fn unlock(&self) {
        (**self).unlock();
    }

    #[inline]
    fn lock_shared(&self) {
        (**self).lock_shared();
    }

    #[inline]
    fn try_lock_shared(&self) -> bool {
        (**self).try_lock_shared()
    }

    #[inline]
    fn unlock_shared(&self) {
        (**self).unlock_shared();
    }
}

impl<L: TimedShareLock + ?Sized> TimedShareLock for &L {
    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_for(timeout)
    }

    #[inline]
    fn try_lock_until(&self, deadline: Instant) -> bool {
        (**self).try_lock_until(deadline)
    }

    #[inline]
    fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_shared_for(timeout)
    }

    #[inline]
    fn try_lock_shared_until(&self, deadline: Instant) -> bool {
        (**self).try_lock_shared_until(deadline)
    }
}

/// blanket impl for Arc<L> - zero cost, just forwards.
impl<L: ShareLock + ?Sized> ShareLock for Arc<L> {
    #[inline]
    fn lock(&self) {
        (**self).lock();
    }

    #[inline]
    fn try_lock(&self) -> bool {
        (**self).try_lock()
    }

    #[inline]
    fn unlock(&self) {
        (**self).unlock();
    }

    #[inline]
    fn lock_shared(&self) {
        (**self).lock_shared();
    }

    #[inline]
    fn try_lock_shared(&self) -> bool {
        (**self).try_lock_shared()
    }

    #[inline]
    fn unlock_shared(&self) {
        (**self).unlock_shared();
    }
}

impl<L: TimedShareLock + ?Sized> TimedShareLock for Arc<L> {
    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_for(timeout)
    }

    #[inline]
    fn try_lock_until(&self, deadline: Instant) -> bool {
        (**self).try_lock_until(deadline)
    }

    #[inline]
    fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        (**self).try_lock_shared_for(timeout)
    }

    #[inline]
    fn try_lock_shared_until(&self, deadline: Instant) -> bool {
        (**self).try_lock_shared_until(deadline)
    }
}
