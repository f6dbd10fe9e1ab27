//! Concurrency behaviour of MemoCache: stampede protection, failure
//! handling, expiry, invalidation callbacks, and invalidation racing a
//! computation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use toets_cache::{InvalidationCause, MemoCache};

fn shared_cache() -> Arc<MemoCache<String, Arc<String>>> {
    Arc::new(MemoCache::builder("stampede").build())
}

#[test]
fn ten_concurrent_callers_compute_once() {
    let cache = shared_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(10));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_compute::<(), _>("rules".to_string(), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Ok(Arc::new("loaded".to_string()))
                    })
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(results.len(), 10);
    // Every caller got the very same stored value.
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    let stats = cache.stats();
    assert_eq!(stats.computations, 1);
    assert_eq!(stats.hits + stats.coalesced, 9);
    assert_eq!(cache.inflight_count(), 0);
}

#[test]
fn failed_computation_is_not_cached() {
    let cache: MemoCache<String, u32> = MemoCache::builder("failing").build();
    let calls = AtomicUsize::new(0);

    let first: Result<u32, String> = cache.get_or_compute("k".to_string(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("source unreadable".to_string())
    });
    assert_eq!(first, Err("source unreadable".to_string()));
    assert_eq!(cache.get(&"k".to_string()), None);

    let second: Result<u32, String> = cache.get_or_compute("k".to_string(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(7)
    });
    assert_eq!(second, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.stats().failures, 1);
}

#[test]
fn waiters_retry_after_a_failed_computation() {
    let cache: Arc<MemoCache<String, u32>> = Arc::new(MemoCache::builder("retry").build());
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_compute("k".to_string(), || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    if n == 0 {
                        Err("first attempt fails")
                    } else {
                        Ok(99)
                    }
                })
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // The first computation fails, the next one succeeds and is shared.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert_eq!(results.iter().filter(|r| **r == Ok(99)).count(), 3);
}

#[test]
fn invalidation_during_computation_discards_the_result() {
    let cache = shared_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let worker = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        thread::spawn(move || {
            cache
                .get_or_compute::<(), _>("rules".to_string(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(Arc::new("stale".to_string()))
                })
                .unwrap()
        })
    };

    started_rx.recv().unwrap();
    // Nothing stored yet, but the computation in flight must not survive.
    assert!(!cache.invalidate(&"rules".to_string()));
    release_tx.send(()).unwrap();

    assert_eq!(*worker.join().unwrap(), "stale");
    assert!(cache.get(&"rules".to_string()).is_none());

    let fresh = cache
        .get_or_compute::<(), _>("rules".to_string(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new("fresh".to_string()))
        })
        .unwrap();
    assert_eq!(*fresh, "fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.inflight_count(), 0);
}

#[test]
fn unrelated_keys_compute_in_parallel() {
    let cache: Arc<MemoCache<String, usize>> = Arc::new(MemoCache::builder("parallel").build());
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_insert_with(format!("key-{i}"), || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(100));
                    active.fetch_sub(1, Ordering::SeqCst);
                    i
                })
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert!(
        peak.load(Ordering::SeqCst) > 1,
        "distinct keys were serialized behind one lock"
    );
}

#[test]
fn entries_expire_after_ttl() {
    let cache: MemoCache<String, u32> = MemoCache::builder("ttl")
        .time_to_live(Duration::from_millis(50))
        .build();
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        5
    };

    assert_eq!(cache.get_or_insert_with("k".to_string(), compute), 5);
    thread::sleep(Duration::from_millis(120));
    assert_eq!(cache.get(&"k".to_string()), None);
    assert_eq!(cache.get_or_insert_with("k".to_string(), compute), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn listeners_hear_explicit_invalidation() {
    let cache: MemoCache<String, u32> = MemoCache::builder("listen").build();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    cache.on_invalidate(move |key: &String, cause| {
        sink.lock().unwrap().push((key.clone(), cause));
    });

    cache.insert("a".to_string(), 1);
    cache.insert("b".to_string(), 2);
    assert!(cache.invalidate(&"a".to_string()));
    assert!(!cache.invalidate(&"missing".to_string()));
    assert_eq!(cache.invalidate_all(), 1);

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ("a".to_string(), InvalidationCause::Explicit),
            ("b".to_string(), InvalidationCause::Explicit),
        ]
    );
}

#[test]
fn listeners_hear_expiry() {
    let cache: MemoCache<String, u32> = MemoCache::builder("expiry")
        .time_to_live(Duration::from_millis(30))
        .build();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    cache.on_invalidate(move |key: &String, cause| {
        sink.lock().unwrap().push((key.clone(), cause));
    });

    cache.insert("k".to_string(), 1);
    thread::sleep(Duration::from_millis(80));
    cache.run_pending_tasks();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![("k".to_string(), InvalidationCause::Expired)]);
}

#[test]
fn panicking_listener_does_not_block_others() {
    let cache: MemoCache<String, u32> = MemoCache::builder("panicky").build();
    let count = Arc::new(AtomicUsize::new(0));
    cache.on_invalidate(|_, _| panic!("listener bug"));
    let counter = Arc::clone(&count);
    cache.on_invalidate(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(cache.listener_count(), 2);

    cache.insert("k".to_string(), 1);
    cache.invalidate(&"k".to_string());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
