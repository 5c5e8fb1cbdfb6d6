//! the reader/writer lock.
//!
//! # how it works
//!
//! two blocking words carry the whole state:
//!
//! - `writers` counts threads currently attempting or holding exclusive
//!   access. a nonzero count blocks every *new* shared acquisition, which
//!   is what gives writers priority.
//! - `holders` is 0 when unlocked, 1..N while N shared holders are active,
//!   and carries [`WRITER_BIAS`] while exclusively held.
//!
//! writers announce intent first (`writers += 1`), then CAS `holders` from
//! 0 to the bias, sleeping on `holders` between attempts. readers check
//! `writers`, optimistically raise `holders`, then re-check `writers` and
//! undo if a writer raced in. every failed or abandoned attempt rolls the
//! counters back exactly, so a timeout can never leave the lock biased.

use std::fmt;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use ward_traits::{ShareLock, TimedShareLock};
use ward_word::WaitWord;

/// sentinel added to the holder word while exclusively held.
///
/// must exceed any plausible concurrent shared-holder count; reaching it
/// with shared holds alone is an unchecked precondition violation.
const WRITER_BIAS: u32 = 0x1000_0000;

/// a writer-priority shared/exclusive lock over two blocking words.
///
/// starts unlocked. acquiring and releasing are separate calls rather than
/// a guard: any thread may call `unlock`/`unlock_shared` for a hold
/// acquired on another thread. releasing a mode that is not held is a
/// contract violation and is not checked.
///
/// # example
///
/// ```
/// use ward_rwlock::RwLock;
///
/// let lock = RwLock::new();
/// lock.lock();
/// assert!(!lock.try_lock());
/// lock.unlock();
/// assert!(lock.try_lock());
/// lock.unlock();
/// ```
pub struct RwLock {
    /// count of threads attempting or holding exclusive access.
    writers: WaitWord,
    /// 0 = unlocked, 1..N = shared holders, >= WRITER_BIAS = exclusive.
    holders: WaitWord,
}

impl RwLock {
    /// create a new unlocked lock.
    #[inline]
    pub const fn new() -> Self {
        Self {
            writers: WaitWord::new(0),
            holders: WaitWord::new(0),
        }
    }

    /// acquire exclusive access, blocking until available.
    pub fn lock(&self) {
        self.writers.fetch_add(1, Ordering::Acquire);
        loop {
            let observed = self.grab_exclusive();
            if observed == 0 {
                return;
            }
            self.holders.wait(observed);
        }
    }

    /// attempt exclusive access without blocking.
    pub fn try_lock(&self) -> bool {
        self.writers.fetch_add(1, Ordering::Acquire);
        if self.grab_exclusive() != 0 {
            self.retire_writer();
            return false;
        }
        true
    }

    /// attempt exclusive access, blocking at most `timeout`.
    ///
    /// the deadline is fixed up front, so retried waits share one budget.
    #[inline]
    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        self.try_lock_until(Instant::now() + timeout)
    }

    /// attempt exclusive access, blocking until `deadline`.
    pub fn try_lock_until(&self, deadline: Instant) -> bool {
        self.writers.fetch_add(1, Ordering::Acquire);
        loop {
            let observed = self.grab_exclusive();
            if observed == 0 {
                return true;
            }
            if !self.holders.wait_until(observed, deadline) {
                self.retire_writer();
                return false;
            }
        }
    }

    /// release exclusive access.
    pub fn unlock(&self) {
        self.holders.fetch_sub(WRITER_BIAS, Ordering::Release);
        if !self.retire_writer() {
            // more writers are pending: hand the holder word to one of them
            self.holders.wake_one();
        }
    }

    /// acquire shared access, blocking while any writer is pending or active.
    pub fn lock_shared(&self) {
        loop {
            let pending = self.grab_shared();
            if pending == 0 {
                return;
            }
            self.writers.wait(pending);
        }
    }

    /// attempt shared access without blocking.
    #[inline]
    pub fn try_lock_shared(&self) -> bool {
        self.grab_shared() == 0
    }

    /// attempt shared access, blocking at most `timeout`.
    #[inline]
    pub fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        self.try_lock_shared_until(Instant::now() + timeout)
    }

    /// attempt shared access, blocking until `deadline`.
    pub fn try_lock_shared_until(&self, deadline: Instant) -> bool {
        loop {
            let pending = self.grab_shared();
            if pending == 0 {
                return true;
            }
            if !self.writers.wait_until(pending, deadline) {
                return false;
            }
        }
    }

    /// release one shared hold.
    pub fn unlock_shared(&self) {
        if self.holders.fetch_sub(1, Ordering::Release) == 1
            && self.writers.load(Ordering::Acquire) > 0
        {
            // last reader out with a writer waiting on the holder word
            self.holders.wake_one();
        }
    }

    /// single CAS attempt on the holder word. returns the observed value
    /// (0 means the exclusive bias was installed).
    #[inline]
    fn grab_exclusive(&self) -> u32 {
        match self
            .holders
            .compare_exchange(0, WRITER_BIAS, Ordering::Acquire, Ordering::Relaxed)
        {
            Ok(_) => 0,
            Err(observed) => observed,
        }
    }

    /// one optimistic shared round trip: check writer intent, raise the
    /// holder count, re-check. returns the pending-writer count that
    /// blocked the attempt (0 = shared access acquired).
    #[inline]
    fn grab_shared(&self) -> u32 {
        let mut pending = self.writers.load(Ordering::Acquire);
        if pending == 0 {
            self.holders.fetch_add(1, Ordering::Acquire);
            pending = self.writers.load(Ordering::Acquire);
            if pending > 0 {
                // a writer announced itself mid-flight: undo is a plain
                // shared release, including the wake of a waiting writer
                self.unlock_shared();
            }
        }
        pending
    }

    /// retire one writer announcement. when the count hits zero every
    /// blocked reader is released; returns whether that happened.
    #[inline]
    fn retire_writer(&self) -> bool {
        if self.writers.fetch_sub(1, Ordering::Release) == 1 {
            self.writers.wake_all();
            return true;
        }
        false
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let holders = self.holders.load(Ordering::Relaxed);
        let state: &dyn fmt::Debug = if holders >= WRITER_BIAS {
            &"exclusive"
        } else if holders > 0 {
            &holders
        } else {
            &"unlocked"
        };
        f.debug_struct("RwLock")
            .field("state", state)
            .field("pending_writers", &self.writers.load(Ordering::Relaxed))
            .finish()
    }
}

impl ShareLock for RwLock {
    #[inline]
    fn lock(&self) {
        RwLock::lock(self);
    }

    #[inline]
    fn try_lock(&self) -> bool {
        RwLock::try_lock(self)
    }

    #[inline]
    fn unlock(&self) {
        RwLock::unlock(self);
    }

    #[inline]
    fn lock_shared(&self) {
        RwLock::lock_shared(self);
    }

    #[inline]
    fn try_lock_shared(&self) -> bool {
        RwLock::try_lock_shared(self)
    }

    #[inline]
    fn unlock_shared(&self) {
        RwLock::unlock_shared(self);
    }
}

impl TimedShareLock for RwLock {
    #[inline]
    fn try_lock_for(&self, timeout: Duration) -> bool {
        RwLock::try_lock_for(self, timeout)
    }

    #[inline]
    fn try_lock_until(&self, deadline: Instant) -> bool {
        RwLock::try_lock_until(self, deadline)
    }

    #[inline]
    fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        RwLock::try_lock_shared_for(self, timeout)
    }

    #[inline]
    fn try_lock_shared_until(&self, deadline: Instant) -> bool {
        RwLock::try_lock_shared_until(self, deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_round_trip() {
        let lock = RwLock::new();
        lock.lock();
        lock.unlock();
        lock.lock();
        lock.unlock();
    }

    #[test]
    fn test_exclusive_excludes_everything() {
        let lock = RwLock::new();
        lock.lock();
        assert!(!lock.try_lock());
        assert!(!lock.try_lock_shared());
        lock.unlock();
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_shared_coexists_and_blocks_writers() {
        let lock = RwLock::new();
        lock.lock_shared();
        assert!(lock.try_lock_shared());
        assert!(!lock.try_lock());
        lock.unlock_shared();
        // one shared holder still active
        assert!(!lock.try_lock());
        lock.unlock_shared();
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_failed_try_lock_rolls_back() {
        let lock = RwLock::new();
        lock.lock_shared();
        assert!(!lock.try_lock());
        // the failed writer attempt must not leave intent behind,
        // otherwise new readers would block forever
        assert!(lock.try_lock_shared());
        lock.unlock_shared();
        lock.unlock_shared();
    }

    #[test]
    fn test_cross_thread_unlock() {
        let lock = Arc::new(RwLock::new());
        lock.lock();

        let unlocker = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.unlock())
        };
        unlocker.join().unwrap();

        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_mutual_exclusion_counter() {
        // non-atomic counter raced by writer threads; any lost update
        // means two writers held the lock at once
        const THREADS: usize = 8;
        const ITERS: usize = 10_000;

        struct Shared {
            lock: RwLock,
            counter: std::cell::UnsafeCell<u64>,
        }
        // safety: the counter is only touched while `lock` is held exclusively
        unsafe impl Sync for Shared {}

        let shared = Arc::new(Shared {
            lock: RwLock::new(),
            counter: std::cell::UnsafeCell::new(0),
        });

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..ITERS {
                        shared.lock.lock();
                        // safety: exclusive hold
                        unsafe { *shared.counter.get() += 1 };
                        shared.lock.unlock();
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        // safety: all writers joined
        assert_eq!(unsafe { *shared.counter.get() }, (THREADS * ITERS) as u64);
    }

    #[test]
    fn test_writer_priority_over_reader_stream() {
        let lock = Arc::new(RwLock::new());
        let writer_done = Arc::new(AtomicBool::new(false));
        let reader_turns = Arc::new(AtomicU64::new(0));

        lock.lock_shared();

        let writer = {
            let lock = Arc::clone(&lock);
            let writer_done = Arc::clone(&writer_done);
            thread::spawn(move || {
                lock.lock();
                writer_done.store(true, Ordering::Release);
                lock.unlock();
            })
        };

        // wait until the writer has announced intent
        while lock.writers.load(Ordering::Acquire) == 0 {
            thread::yield_now();
        }

        // a continuous stream of short-lived readers must now be refused
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let writer_done = Arc::clone(&writer_done);
                let reader_turns = Arc::clone(&reader_turns);
                thread::spawn(move || {
                    while !writer_done.load(Ordering::Acquire) {
                        if lock.try_lock_shared() {
                            reader_turns.fetch_add(1, Ordering::Relaxed);
                            lock.unlock_shared();
                        }
                        thread::yield_now();
                    }
                })
            })
            .collect();

        // no new reader can slip in while the writer is pending
        assert!(!lock.try_lock_shared());

        thread::sleep(Duration::from_millis(10));
        assert_eq!(reader_turns.load(Ordering::Relaxed), 0);

        lock.unlock_shared();
        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert!(writer_done.load(Ordering::Acquire));
    }

    #[test]
    fn test_try_lock_for_times_out() {
        let lock = Arc::new(RwLock::new());
        lock.lock();

        let contender = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let timeout = Duration::from_millis(1);
                let start = Instant::now();
                let acquired = lock.try_lock_for(timeout);
                (acquired, start.elapsed() >= timeout)
            })
        };
        let (acquired, waited_long_enough) = contender.join().unwrap();
        assert!(!acquired);
        assert!(waited_long_enough);

        // counters must be exactly as before the attempt
        assert!(!lock.try_lock_shared());
        lock.unlock();
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_try_lock_shared_until_times_out() {
        let lock = RwLock::new();
        lock.lock();

        let deadline = Instant::now() + Duration::from_millis(1);
        assert!(!lock.try_lock_shared_until(deadline));

        lock.unlock();
        assert!(lock.try_lock_shared_until(Instant::now() + Duration::from_millis(1)));
        lock.unlock_shared();
    }

    #[test]
    fn test_timed_acquire_succeeds_before_deadline() {
        let lock = Arc::new(RwLock::new());
        lock.lock();

        let contender = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.try_lock_for(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(10));
        lock.unlock();

        assert!(contender.join().unwrap());
        lock.unlock();
    }

    #[test]
    fn test_shared_concurrency_across_threads() {
        const READERS: usize = 8;
        let lock = Arc::new(RwLock::new());
        let active = Arc::new(AtomicU64::new(0));
        let peak = Arc::new(AtomicU64::new(0));

        let workers: Vec<_> = (0..READERS)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    lock.lock_shared();
                    let now = active.fetch_add(1, Ordering::AcqRel) + 1;
                    peak.fetch_max(now, Ordering::AcqRel);
                    thread::sleep(Duration::from_millis(20));
                    active.fetch_sub(1, Ordering::AcqRel);
                    lock.unlock_shared();
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert!(peak.load(Ordering::Acquire) > 1);
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_end_to_end_scenario() {
        // unlocked -> T1 exclusive -> T2 try_shared fails -> T1 releases ->
        // T2 shared -> T3 exclusive blocks -> T2 releases -> T3 acquires
        let lock = Arc::new(RwLock::new());

        lock.lock(); // T1
        assert!(!lock.try_lock_shared()); // T2
        lock.unlock(); // T1
        assert!(lock.try_lock_shared()); // T2

        let t3 = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.lock();
                lock.unlock();
            })
        };

        // give T3 time to announce and block
        while lock.writers.load(Ordering::Acquire) == 0 {
            thread::yield_now();
        }
        assert!(!lock.try_lock()); // still shared-held

        lock.unlock_shared(); // T2
        t3.join().unwrap(); // T3 unblocked, acquired, released

        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_debug_states() {
        let lock = RwLock::new();
        assert!(format!("{:?}", lock).contains("unlocked"));
        lock.lock();
        assert!(format!("{:?}", lock).contains("exclusive"));
        lock.unlock();
        lock.lock_shared();
        assert!(format!("{:?}", lock).contains('1'));
        lock.unlock_shared();
    }
}
