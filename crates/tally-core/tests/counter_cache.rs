//! Behavioural tests for the named-counter cache.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeSet;

use tally_core::error::ClientCode;
use tally_core::NamedCounterCache;

#[test]
fn first_increment_returns_one() {
    let c = NamedCounterCache::new();
    for name in ["a", "requests", "ünïcode", " "] {
        assert_eq!(c.increment(name).unwrap(), 1);
    }
}

#[test]
fn kth_sequential_increment_returns_k() {
    let c = NamedCounterCache::new();
    for k in 1..=50 {
        assert_eq!(c.increment("seq").unwrap(), k);
    }
}

#[test]
fn concurrent_increments_have_no_gaps_or_duplicates() {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 500;

    let c = NamedCounterCache::new();
    let results: Vec<Vec<i64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    (0..PER_THREAD)
                        .map(|_| c.increment("hot").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let total = (THREADS * PER_THREAD) as i64;
    let seen: BTreeSet<i64> = results.into_iter().flatten().collect();
    assert_eq!(seen.len() as i64, total);
    assert_eq!(seen.first().copied(), Some(1));
    assert_eq!(seen.last().copied(), Some(total));
    assert_eq!(c.current("hot").unwrap(), total);
}

#[test]
fn concurrent_first_increments_on_fresh_store() {
    let c = NamedCounterCache::new();
    let mut got: Vec<i64> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..32).map(|_| s.spawn(|| c.increment("fresh").unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    got.sort();
    assert_eq!(got, (1..=32).collect::<Vec<i64>>());
}

#[test]
fn reset_then_increment_starts_over() {
    let c = NamedCounterCache::new();
    c.increment("r").unwrap();
    c.increment("r").unwrap();
    c.reset("r").unwrap();
    assert_eq!(c.current("r").unwrap(), 0);
    assert_eq!(c.increment("r").unwrap(), 1);
}

#[test]
fn reset_of_unknown_name_is_a_noop() {
    let c = NamedCounterCache::new();
    c.increment("other").unwrap();
    c.reset("never-seen").unwrap();
    c.reset("never-seen").unwrap();
    assert_eq!(c.snapshot(), vec![("other".to_string(), 1)]);
}

#[test]
fn distinct_names_are_independent() {
    let c = NamedCounterCache::new();
    c.increment("n1").unwrap();
    c.increment("n1").unwrap();
    assert_eq!(c.increment("n2").unwrap(), 1);
    c.reset("n2").unwrap();
    assert_eq!(c.current("n1").unwrap(), 2);
}

#[test]
fn get_cached_hits_after_increment() {
    let c = NamedCounterCache::new();
    let v = c.increment("g").unwrap();
    assert_eq!(c.get_cached("g").unwrap(), v);
    assert_eq!(c.get_cached("g").unwrap(), v);
    assert_eq!(c.current("g").unwrap(), v);

    let stats = c.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 0);
}

#[test]
fn get_cached_misses_once_then_hits() {
    let c = NamedCounterCache::new();
    assert_eq!(c.get_cached("m").unwrap(), 1);
    assert_eq!(c.get_cached("m").unwrap(), 1);

    let stats = c.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn get_cached_follows_latest_increment() {
    let c = NamedCounterCache::new();
    c.get_cached("w").unwrap();
    c.increment("w").unwrap();
    assert_eq!(c.get_cached("w").unwrap(), 2);
}

#[test]
fn reset_invalidates_cached_value() {
    let c = NamedCounterCache::new();
    c.increment("e").unwrap();
    c.increment("e").unwrap();
    c.reset("e").unwrap();
    assert_eq!(c.stats().entries, 0);
    assert_eq!(c.get_cached("e").unwrap(), 1);
}

#[test]
fn cached_value_matches_store_after_concurrent_writes() {
    let c = NamedCounterCache::new();
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..200 {
                    c.increment("cw").unwrap();
                }
            });
        }
    });
    assert_eq!(c.get_cached("cw").unwrap(), 1600);
}

#[test]
fn reset_racing_increments_leaves_no_stale_cache_entry() {
    for _ in 0..200 {
        let c = NamedCounterCache::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        c.increment("k").unwrap();
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..20 {
                    c.reset("k").unwrap();
                }
            });
        });

        let current = c.current("k").unwrap();
        if current == 0 {
            assert_eq!(c.stats().entries, 0);
        } else {
            assert_eq!(c.get_cached("k").unwrap(), current);
        }
    }
}

#[test]
fn empty_name_is_invalid_argument() {
    let c = NamedCounterCache::new();
    for err in [
        c.increment("").unwrap_err(),
        c.get_cached("").unwrap_err(),
        c.reset("").unwrap_err(),
        c.current("").unwrap_err(),
    ] {
        assert_eq!(err.client_code(), ClientCode::InvalidArgument);
    }
    assert!(c.snapshot().is_empty());
}

#[test]
fn example_scenario() {
    let c = NamedCounterCache::new();
    assert_eq!(c.increment("requests").unwrap(), 1);
    assert_eq!(c.increment("requests").unwrap(), 2);
    c.reset("requests").unwrap();
    assert_eq!(c.increment("requests").unwrap(), 1);
    assert_eq!(c.increment("errors").unwrap(), 1);
    assert_eq!(
        c.snapshot(),
        vec![("errors".to_string(), 1), ("requests".to_string(), 1)]
    );
}
