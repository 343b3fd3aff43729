//! Reconnect throttle stress tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use kv_resilience_reconnect::{ReconnectConfig, ReconnectDenied, ReconnectThrottle};

use super::ConcurrencyTracker;

/// Test: Many threads failing continuously against a short interval
#[test]
#[ignore]
fn stress_64_threads_continuous_failures() {
    println!("\n=== Throttle: 64 threads x 2000 failures ===");

    let interval = Duration::from_millis(5);
    let throttle = Arc::new(ReconnectThrottle::new(
        ReconnectConfig::builder()
            .name("stress")
            .min_reconnect_interval(interval)
            .max_failure_window(Duration::from_secs(3600))
            .reconnect_lock_timeout(Duration::from_millis(50))
            .build(),
    ));
    let tracker = ConcurrencyTracker::new();
    let granted_at = Arc::new(Mutex::new(Vec::new()));
    let contended = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(64));

    let start = Instant::now();
    let handles: Vec<_> = (0..64)
        .map(|_| {
            let throttle = Arc::clone(&throttle);
            let tracker = Arc::clone(&tracker);
            let granted_at = Arc::clone(&granted_at);
            let contended = Arc::clone(&contended);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..2000 {
                    let result = throttle.decide(|| {
                        tracker.enter();
                        granted_at.lock().unwrap().push(Instant::now());
                        thread::sleep(Duration::from_micros(200));
                        tracker.exit();
                        Ok::<_, std::io::Error>(())
                    });
                    if let Err(ReconnectDenied::LockContended { .. }) = result {
                        contended.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let elapsed = start.elapsed();

    let granted = granted_at.lock().unwrap();
    let snapshot = throttle.snapshot();
    println!("Elapsed: {:?}", elapsed);
    println!("Reconnects: {}", snapshot.reconnects);
    println!("Denials: {}", snapshot.denials);
    println!("Lock contended: {}", contended.load(Ordering::Relaxed));
    println!("Peak concurrent reconnects: {}", tracker.peak());

    assert_eq!(tracker.peak(), 1, "reconnects must never overlap");
    assert_eq!(snapshot.reconnects, granted.len() as u64);
    assert_eq!(snapshot.reconnects + snapshot.denials, 64 * 2000);
    for pair in granted.windows(2) {
        // the next reconnect starts after the previous one finished
        assert!(pair[1].duration_since(pair[0]) >= interval);
    }
}

/// Test: Lock waiters never exceed the configured timeout by much
#[test]
#[ignore]
fn stress_lock_wait_is_bounded() {
    println!("\n=== Throttle: bounded lock wait under a slow reconnect ===");

    let lock_timeout = Duration::from_millis(100);
    let throttle = Arc::new(ReconnectThrottle::new(
        ReconnectConfig::builder()
            .min_reconnect_interval(Duration::ZERO)
            .reconnect_lock_timeout(lock_timeout)
            .build(),
    ));
    let barrier = Arc::new(Barrier::new(128));

    let handles: Vec<_> = (0..128)
        .map(|_| {
            let throttle = Arc::clone(&throttle);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let start = Instant::now();
                let result = throttle.decide(|| {
                    thread::sleep(Duration::from_millis(500));
                    Ok::<_, std::io::Error>(())
                });
                (result, start.elapsed())
            })
        })
        .collect();

    let mut slowest_denial = Duration::ZERO;
    for handle in handles {
        let (result, waited) = handle.join().unwrap();
        if result.is_err() {
            slowest_denial = slowest_denial.max(waited);
        }
    }

    println!("Slowest denial: {:?}", slowest_denial);
    assert!(slowest_denial < lock_timeout + Duration::from_millis(400));
}
