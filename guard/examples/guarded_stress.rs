//! mixed-mode stress demo for Guarded<T, RwLock>
//!
//! writers mutate a shared ledger through exclusive guards, readers audit it
//! through shared guards, and a timed thread probes with bounded waits.
//!
//! run with: cargo run --release --example guarded_stress

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ward_guard::Guarded;
use ward_rwlock::RwLock;

const WRITERS: usize = 2;
const READERS: usize = 6;
const WRITES_PER_THREAD: u64 = 200_000;

/// the protected state: every writer appends to its own column, so an
/// audit can verify no increment was lost or torn.
struct Ledger {
    per_writer: [u64; WRITERS],
    total: u64,
}

impl Ledger {
    const fn new() -> Self {
        Self {
            per_writer: [0; WRITERS],
            total: 0,
        }
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!(
        "starting: {} writers x {} increments, {} readers",
        WRITERS,
        WRITES_PER_THREAD,
        READERS
    );

    let ledger: Arc<Guarded<Ledger, RwLock>> = Arc::new(Guarded::new(Ledger::new()));
    let done = Arc::new(AtomicBool::new(false));
    let audits = Arc::new(AtomicU64::new(0));
    let timed_misses = Arc::new(AtomicU64::new(0));

    let start = Instant::now();

    let writers: Vec<_> = (0..WRITERS)
        .map(|id| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..WRITES_PER_THREAD {
                    let mut guard = ledger.lock();
                    guard.per_writer[id] += 1;
                    guard.total += 1;
                }
                log::info!("writer {} finished", id);
            })
        })
        .collect();

    let readers: Vec<_> = (0..READERS)
        .map(|id| {
            let ledger = Arc::clone(&ledger);
            let done = Arc::clone(&done);
            let audits = Arc::clone(&audits);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let guard = ledger.lock_shared();
                    let sum: u64 = guard.per_writer.iter().sum();
                    assert_eq!(sum, guard.total, "reader {} saw a torn ledger", id);
                    drop(guard);
                    audits.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    // a probe that never waits more than a millisecond per attempt
    let prober = {
        let ledger = Arc::clone(&ledger);
        let done = Arc::clone(&done);
        let timed_misses = Arc::clone(&timed_misses);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                match ledger.try_lock_shared_for(Duration::from_millis(1)) {
                    Some(guard) => {
                        let total = guard.total;
                        drop(guard);
                        log::info!("probe: total={}", total);
                    }
                    None => {
                        timed_misses.fetch_add(1, Ordering::Relaxed);
                    }
                }
                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for r in readers {
        r.join().unwrap();
    }
    prober.join().unwrap();

    let elapsed = start.elapsed();
    let final_total = {
        let guard = ledger.lock_shared();
        assert_eq!(guard.per_writer.iter().sum::<u64>(), guard.total);
        guard.total
    };
    let expected = WRITERS as u64 * WRITES_PER_THREAD;

    log::info!("done in {:.2}s", elapsed.as_secs_f64());
    log::info!(
        "total={} expected={} ({})",
        final_total,
        expected,
        if final_total == expected { "OK" } else { "MISMATCH" }
    );
    log::info!(
        "reader audits: {}, timed probe misses: {}",
        audits.load(Ordering::Relaxed),
        timed_misses.load(Ordering::Relaxed)
    );
}
