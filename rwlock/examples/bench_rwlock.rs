//! benchmark: ward RwLock vs std::sync::RwLock
//!
//! run with: cargo run --release --example bench_rwlock

use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use ward_rwlock::RwLock;

const ITERATIONS: u64 = 10_000_000;
const WARMUP: u64 = 100_000;

const READER_THREADS: usize = 4;
const CONTENDED_ITERATIONS: u64 = 1_000_000;

fn bench_ward_exclusive(lock: &RwLock) -> u128 {
    // warmup
    for _ in 0..WARMUP {
        black_box(lock).lock();
        black_box(lock).unlock();
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        black_box(lock).lock();
        black_box(lock).unlock();
    }
    start.elapsed().as_nanos()
}

fn bench_ward_shared(lock: &RwLock) -> u128 {
    // warmup
    for _ in 0..WARMUP {
        black_box(lock).lock_shared();
        black_box(lock).unlock_shared();
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        black_box(lock).lock_shared();
        black_box(lock).unlock_shared();
    }
    start.elapsed().as_nanos()
}

fn bench_std_exclusive(lock: &std::sync::RwLock<()>) -> u128 {
    // warmup
    for _ in 0..WARMUP {
        drop(black_box(lock).write().unwrap());
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        drop(black_box(lock).write().unwrap());
    }
    start.elapsed().as_nanos()
}

fn bench_std_shared(lock: &std::sync::RwLock<()>) -> u128 {
    // warmup
    for _ in 0..WARMUP {
        drop(black_box(lock).read().unwrap());
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        drop(black_box(lock).read().unwrap());
    }
    start.elapsed().as_nanos()
}

/// several reader threads hammer shared mode while one writer takes the
/// lock in bursts. returns total wall time in nanoseconds.
fn bench_ward_contended(lock: Arc<RwLock>) -> u128 {
    let start = Instant::now();

    let readers: Vec<_> = (0..READER_THREADS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for _ in 0..CONTENDED_ITERATIONS {
                    lock.lock_shared();
                    black_box(&lock);
                    lock.unlock_shared();
                }
            })
        })
        .collect();

    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            for _ in 0..CONTENDED_ITERATIONS / 100 {
                lock.lock();
                black_box(&lock);
                lock.unlock();
            }
        })
    };

    for r in readers {
        r.join().unwrap();
    }
    writer.join().unwrap();

    start.elapsed().as_nanos()
}

fn bench_std_contended(lock: Arc<std::sync::RwLock<()>>) -> u128 {
    let start = Instant::now();

    let readers: Vec<_> = (0..READER_THREADS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for _ in 0..CONTENDED_ITERATIONS {
                    drop(black_box(lock.read().unwrap()));
                }
            })
        })
        .collect();

    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            for _ in 0..CONTENDED_ITERATIONS / 100 {
                drop(black_box(lock.write().unwrap()));
            }
        })
    };

    for r in readers {
        r.join().unwrap();
    }
    writer.join().unwrap();

    start.elapsed().as_nanos()
}

fn main() {
    println!("RwLock Benchmark (ward vs std)");
    println!("==============================");
    println!("iterations: {}", ITERATIONS);
    println!();

    println!("--- Uncontended exclusive ---");
    let ward = RwLock::new();
    let std_lock = std::sync::RwLock::new(());

    let ns_ward = bench_ward_exclusive(&ward);
    let per_ward = ns_ward as f64 / ITERATIONS as f64;
    println!("ward lock/unlock:   {:.2} ns/op  (total: {} ms)", per_ward, ns_ward / 1_000_000);

    let ns_std = bench_std_exclusive(&std_lock);
    let per_std = ns_std as f64 / ITERATIONS as f64;
    println!("std  write drop:    {:.2} ns/op  (total: {} ms)", per_std, ns_std / 1_000_000);
    println!();

    println!("--- Uncontended shared ---");
    let ns_ward_sh = bench_ward_shared(&ward);
    let per_ward_sh = ns_ward_sh as f64 / ITERATIONS as f64;
    println!("ward shared:        {:.2} ns/op  (total: {} ms)", per_ward_sh, ns_ward_sh / 1_000_000);

    let ns_std_sh = bench_std_shared(&std_lock);
    let per_std_sh = ns_std_sh as f64 / ITERATIONS as f64;
    println!("std  read drop:     {:.2} ns/op  (total: {} ms)", per_std_sh, ns_std_sh / 1_000_000);
    println!();

    println!("--- Contended ({} readers + 1 bursty writer) ---", READER_THREADS);
    let total_ops = CONTENDED_ITERATIONS * READER_THREADS as u64 + CONTENDED_ITERATIONS / 100;

    let ns_ward_c = bench_ward_contended(Arc::new(RwLock::new()));
    println!(
        "ward:               {:.2} ns/op  (total: {} ms)",
        ns_ward_c as f64 / total_ops as f64,
        ns_ward_c / 1_000_000
    );

    let ns_std_c = bench_std_contended(Arc::new(std::sync::RwLock::new(())));
    println!(
        "std:                {:.2} ns/op  (total: {} ms)",
        ns_std_c as f64 / total_ops as f64,
        ns_std_c / 1_000_000
    );
    println!();

    println!("--- Size Info ---");
    println!("ward RwLock size:          {} bytes", std::mem::size_of::<RwLock>());
    println!("std  RwLock<()> size:      {} bytes", std::mem::size_of::<std::sync::RwLock<()>>());
}
