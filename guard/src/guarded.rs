//! the guard wrapper and its three handle types.

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use ward_traits::{ShareLock, TimedShareLock};

/// a value bound to a lock; all access goes through guard handles.
///
/// the wrapper is only ever borrowed to produce guards, so the value
/// cannot move or be dropped while any handle is alive, so its identity is
/// fixed for as long as anyone can observe it.
///
/// blocking acquires always return a guard; `try_*` and timed variants
/// return `None` on contention or timeout, never an error.
pub struct Guarded<T, L> {
    lock: L,
    value: UnsafeCell<T>,
}

// safety: access to the inner value is mediated by the lock. exclusive
// guards hand out &mut T across threads (T: Send), shared guards hand out
// &T to several threads at once (T: Sync)
unsafe impl<T: Send, L: Send> Send for Guarded<T, L> {}
unsafe impl<T: Send + Sync, L: Sync> Sync for Guarded<T, L> {}

impl<T, L: ShareLock + Default> Guarded<T, L> {
    /// wrap `value` with a default-initialized lock.
    #[inline]
    pub fn new(value: T) -> Self {
        Self::with_lock(value, L::default())
    }
}

impl<T, L: ShareLock> Guarded<T, L> {
    /// wrap `value` with the given lock instance.
    #[inline]
    pub const fn with_lock(value: T, lock: L) -> Self {
        Self {
            lock,
            value: UnsafeCell::new(value),
        }
    }

    /// acquire exclusive access with a mutable view. never returns null;
    /// blocks until available.
    #[inline]
    pub fn lock(&self) -> MutGuard<'_, T, L> {
        self.lock.lock();
        MutGuard { guarded: self }
    }

    /// attempt exclusive access with a mutable view, without blocking.
    #[inline]
    pub fn try_lock(&self) -> Option<MutGuard<'_, T, L>> {
        self.lock.try_lock().then(|| MutGuard { guarded: self })
    }

    /// acquire exclusive access with an immutable view.
    ///
    /// the lock is held in exclusive mode; only the view differs from
    /// [`lock`](Self::lock).
    #[inline]
    pub fn lock_const(&self) -> ConstGuard<'_, T, L> {
        self.lock.lock();
        ConstGuard { guarded: self }
    }

    /// attempt exclusive access with an immutable view, without blocking.
    #[inline]
    pub fn try_lock_const(&self) -> Option<ConstGuard<'_, T, L>> {
        self.lock.try_lock().then(|| ConstGuard { guarded: self })
    }

    /// acquire shared access. coexists with other shared guards.
    #[inline]
    pub fn lock_shared(&self) -> SharedGuard<'_, T, L> {
        self.lock.lock_shared();
        SharedGuard { guarded: self }
    }

    /// attempt shared access without blocking.
    #[inline]
    pub fn try_lock_shared(&self) -> Option<SharedGuard<'_, T, L>> {
        self.lock
            .try_lock_shared()
            .then(|| SharedGuard { guarded: self })
    }

    /// consume the wrapper and return the value. no locking: exclusive
    /// ownership proves no guard exists.
    #[inline]
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// mutable access through exclusive ownership. no locking needed.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

impl<T, L: TimedShareLock> Guarded<T, L> {
    /// attempt exclusive access, blocking at most `timeout`.
    #[inline]
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MutGuard<'_, T, L>> {
        self.lock
            .try_lock_for(timeout)
            .then(|| MutGuard { guarded: self })
    }

    /// attempt exclusive access, blocking until `deadline`.
    #[inline]
    pub fn try_lock_until(&self, deadline: Instant) -> Option<MutGuard<'_, T, L>> {
        self.lock
            .try_lock_until(deadline)
            .then(|| MutGuard { guarded: self })
    }

    /// attempt exclusive access with an immutable view, blocking at most
    /// `timeout`.
    #[inline]
    pub fn try_lock_const_for(&self, timeout: Duration) -> Option<ConstGuard<'_, T, L>> {
        self.lock
            .try_lock_for(timeout)
            .then(|| ConstGuard { guarded: self })
    }

    /// attempt exclusive access with an immutable view, blocking until
    /// `deadline`.
    #[inline]
    pub fn try_lock_const_until(&self, deadline: Instant) -> Option<ConstGuard<'_, T, L>> {
        self.lock
            .try_lock_until(deadline)
            .then(|| ConstGuard { guarded: self })
    }

    /// attempt shared access, blocking at most `timeout`.
    #[inline]
    pub fn try_lock_shared_for(&self, timeout: Duration) -> Option<SharedGuard<'_, T, L>> {
        self.lock
            .try_lock_shared_for(timeout)
            .then(|| SharedGuard { guarded: self })
    }

    /// attempt shared access, blocking until `deadline`.
    #[inline]
    pub fn try_lock_shared_until(&self, deadline: Instant) -> Option<SharedGuard<'_, T, L>> {
        self.lock
            .try_lock_shared_until(deadline)
            .then(|| SharedGuard { guarded: self })
    }
}

impl<T: fmt::Debug, L: ShareLock> fmt::Debug for Guarded<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock_shared() {
            Some(guard) => f.debug_struct("Guarded").field("value", &*guard).finish(),
            None => f
                .debug_struct("Guarded")
                .field("value", &"<locked>")
                .finish(),
        }
    }
}

/// exclusive-mode guard with a mutable view.
///
/// releases the exclusive hold on drop. the one legal cross-mode
/// conversion is [`into_const`](Self::into_const).
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct MutGuard<'a, T, L: ShareLock> {
    guarded: &'a Guarded<T, L>,
}

impl<'a, T, L: ShareLock> MutGuard<'a, T, L> {
    /// narrow to an immutable view without touching the lock.
    ///
    /// the exclusive hold transfers as-is: nothing is released and nothing
    /// is re-acquired, so no other thread can sneak in during the move.
    #[inline]
    pub fn into_const(self) -> ConstGuard<'a, T, L> {
        let guarded = self.guarded;
        // the hold moves into the new guard instead of being released here
        std::mem::forget(self);
        ConstGuard { guarded }
    }
}

impl<T, L: ShareLock> Deref for MutGuard<'_, T, L> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // safety: the lock is held in exclusive mode
        unsafe { &*self.guarded.value.get() }
    }
}

impl<T, L: ShareLock> DerefMut for MutGuard<'_, T, L> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // safety: the lock is held in exclusive mode
        unsafe { &mut *self.guarded.value.get() }
    }
}

impl<T, L: ShareLock> Drop for MutGuard<'_, T, L> {
    #[inline]
    fn drop(&mut self) {
        self.guarded.lock.unlock();
    }
}

impl<'a, T, L: ShareLock> From<MutGuard<'a, T, L>> for ConstGuard<'a, T, L> {
    #[inline]
    fn from(guard: MutGuard<'a, T, L>) -> Self {
        guard.into_const()
    }
}

impl<T: fmt::Debug, L: ShareLock> fmt::Debug for MutGuard<'_, T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutGuard").field(&**self).finish()
    }
}

/// exclusive-mode guard with an immutable view.
///
/// holds the lock exactly like [`MutGuard`]; only the view is narrowed.
/// releases the exclusive hold on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ConstGuard<'a, T, L: ShareLock> {
    guarded: &'a Guarded<T, L>,
}

impl<T, L: ShareLock> Deref for ConstGuard<'_, T, L> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // safety: the lock is held in exclusive mode
        unsafe { &*self.guarded.value.get() }
    }
}

impl<T, L: ShareLock> Drop for ConstGuard<'_, T, L> {
    #[inline]
    fn drop(&mut self) {
        self.guarded.lock.unlock();
    }
}

impl<T: fmt::Debug, L: ShareLock> fmt::Debug for ConstGuard<'_, T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstGuard").field(&**self).finish()
    }
}

/// shared-mode guard with an immutable view.
///
/// coexists with any number of other shared guards on the same wrapper;
/// releases one shared hold on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SharedGuard<'a, T, L: ShareLock> {
    guarded: &'a Guarded<T, L>,
}

impl<T, L: ShareLock> Deref for SharedGuard<'_, T, L> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // safety: the lock is held in shared mode, no mutable view exists
        unsafe { &*self.guarded.value.get() }
    }
}

impl<T, L: ShareLock> Clone for SharedGuard<'_, T, L> {
    /// take another shared hold on the same lock.
    ///
    /// this runs the full shared-acquisition protocol rather than bumping
    /// a holder count, so it can block if a writer announced itself in the
    /// meantime. each copy releases independently.
    fn clone(&self) -> Self {
        self.guarded.lock.lock_shared();
        Self {
            guarded: self.guarded,
        }
    }
}

impl<T, L: ShareLock> Drop for SharedGuard<'_, T, L> {
    #[inline]
    fn drop(&mut self) {
        self.guarded.lock.unlock_shared();
    }
}

impl<T: fmt::Debug, L: ShareLock> fmt::Debug for SharedGuard<'_, T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedGuard").field(&**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use ward_rwlock::RwLock;

    #[test]
    fn test_lock_and_mutate() {
        let guarded: Guarded<Vec<u32>, RwLock> = Guarded::new(vec![1, 2]);
        guarded.lock().push(3);
        assert_eq!(*guarded.lock_shared(), vec![1, 2, 3]);
    }

    #[test]
    fn test_try_lock_contention_returns_none() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(0);
        let held = guarded.lock();
        assert!(guarded.try_lock().is_none());
        assert!(guarded.try_lock_const().is_none());
        assert!(guarded.try_lock_shared().is_none());
        drop(held);
        assert!(guarded.try_lock().is_some());
    }

    #[test]
    fn test_shared_guards_coexist() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(7);
        let a = guarded.lock_shared();
        let b = guarded.try_lock_shared().expect("shared coexists");
        assert_eq!(*a, 7);
        assert_eq!(*b, 7);
        assert!(guarded.try_lock().is_none());
    }

    #[test]
    fn test_const_guard_holds_exclusive() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(1);
        let guard = guarded.lock_const();
        assert_eq!(*guard, 1);
        assert!(guarded.try_lock_shared().is_none());
        drop(guard);
        assert!(guarded.try_lock_shared().is_some());
    }

    #[test]
    fn test_narrowing_move_keeps_exclusivity() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(5);
        let guard = guarded.lock();
        let narrowed: ConstGuard<'_, u32, RwLock> = guard.into_const();
        // still exclusively held across the conversion
        assert!(guarded.try_lock().is_none());
        assert!(guarded.try_lock_shared().is_none());
        assert_eq!(*narrowed, 5);
        drop(narrowed);
        assert!(guarded.try_lock().is_some());
    }

    #[test]
    fn test_shared_clone_releases_independently() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(0);
        let original = guarded.lock_shared();
        let copy = original.clone();

        drop(original);
        // the clone still holds shared access
        assert!(guarded.try_lock().is_none());
        drop(copy);
        assert!(guarded.try_lock().is_some());
    }

    #[test]
    fn test_timed_acquire() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(0);
        let held = guarded.lock();
        assert!(guarded.try_lock_for(Duration::from_millis(1)).is_none());
        assert!(guarded
            .try_lock_shared_until(Instant::now() + Duration::from_millis(1))
            .is_none());
        drop(held);
        assert!(guarded.try_lock_for(Duration::from_millis(1)).is_some());
        assert!(guarded
            .try_lock_const_for(Duration::from_millis(1))
            .is_some());
    }

    #[test]
    fn test_cross_thread_guard_release() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(0);

        thread::scope(|s| {
            let guard = guarded.lock();
            // the guard itself moves to another thread and drops there
            s.spawn(move || drop(guard)).join().unwrap();
        });

        assert!(guarded.try_lock().is_some());
    }

    #[test]
    fn test_into_inner_and_get_mut() {
        let mut guarded: Guarded<String, RwLock> = Guarded::new(String::from("a"));
        guarded.get_mut().push('b');
        assert_eq!(guarded.into_inner(), "ab");
    }

    #[test]
    fn test_concurrent_writers_through_guard() {
        const THREADS: usize = 4;
        const ITERS: usize = 5_000;
        let guarded: Arc<Guarded<u64, RwLock>> = Arc::new(Guarded::new(0));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let guarded = Arc::clone(&guarded);
                thread::spawn(move || {
                    for _ in 0..ITERS {
                        *guarded.lock() += 1;
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(*guarded.lock_shared(), (THREADS * ITERS) as u64);
    }

    #[test]
    fn test_debug_shows_value_or_locked() {
        let guarded: Guarded<u32, RwLock> = Guarded::new(9);
        assert!(format!("{:?}", guarded).contains('9'));
        let _held = guarded.lock();
        assert!(format!("{:?}", guarded).contains("locked"));
    }
}
