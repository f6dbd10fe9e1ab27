use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use toets_cache::MemoCache;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// N concurrent callers on one missing key: one computation, one value.
    #[test]
    fn concurrent_callers_share_one_computation(callers in 1usize..16, value in any::<u64>()) {
        let cache: Arc<MemoCache<u32, u64>> = Arc::new(MemoCache::builder("prop").build());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(callers));

        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_insert_with(1, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        value
                    })
                })
            })
            .collect();

        let results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        prop_assert!(results.iter().all(|r| *r == value));
    }

    /// A failure on attempt k never short-circuits attempt k + 1.
    #[test]
    fn failures_are_never_memoized(failures in 1usize..6) {
        let cache: MemoCache<u32, u32> = MemoCache::builder("prop-fail").build();
        let calls = AtomicUsize::new(0);
        for _ in 0..failures {
            let r: Result<u32, &str> = cache.get_or_compute(9, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            });
            prop_assert!(r.is_err());
        }
        let r: Result<u32, &str> = cache.get_or_compute(9, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(3)
        });
        prop_assert_eq!(r, Ok(3));
        prop_assert_eq!(calls.load(Ordering::SeqCst), failures + 1);
    }
}
