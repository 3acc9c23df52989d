//! Concurrency stress tests for the in-process coordinator.

use primepulse::coordinator::{Coordinator, CoordinatorSettings, Range};
use primepulse::distributed::{RangeReport, WorkerId};
use primepulse::target::TargetNumber;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 16;
const ROUNDS: usize = 200;

fn coordinator(range_size: u64) -> Arc<Coordinator> {
    let settings = CoordinatorSettings {
        range_size,
        ..Default::default()
    };
    Arc::new(Coordinator::new(
        TargetNumber::parse("589").expect("valid number"),
        settings,
    ))
}

/// Many threads assign and submit at once; every range is unique and the
/// merged totals match what was submitted.
#[test]
fn concurrent_assign_and_submit() {
    let coord = coordinator(100);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let coord = coord.clone();
            thread::spawn(move || {
                let id = WorkerId::new(format!("stress-{}", t));
                let mut ranges = Vec::with_capacity(ROUNDS);
                for round in 0..ROUNDS {
                    let range = coord.assign(&id).unwrap();
                    // Every third round reports one divisor
                    let divisors = if round % 3 == 0 { vec![range.start] } else { Vec::new() };
                    coord
                        .submit(RangeReport::completed(id.clone(), range, divisors))
                        .expect("submission with an id is accepted");
                    ranges.push(range);
                }
                ranges
            })
        })
        .collect();

    let mut ranges: Vec<Range> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("stress thread panicked"))
        .collect();

    ranges.sort_by_key(|r| r.start);
    assert_eq!(ranges.len(), THREADS * ROUNDS);
    for pair in ranges.windows(2) {
        assert!(!pair[0].overlaps(&pair[1]), "{} overlaps {}", pair[0], pair[1]);
        assert_eq!(pair[0].end + 1, pair[1].start, "gap between {} and {}", pair[0], pair[1]);
    }

    let last = ranges.last().expect("at least one range");
    let status = coord.status();
    assert_eq!(status.largest_prime_tested, last.end);
    let per_thread = ROUNDS.div_ceil(3) as u64;
    assert_eq!(status.divisors_found, THREADS as u64 * per_thread);
    assert_eq!(coord.divisors().len() as u64, status.divisors_found);
    assert_eq!(status.work_ranges_active, 0);
}

/// Readers polling status while writers submit never see the maximum go down.
#[test]
fn status_is_monotonic_under_contention() {
    let coord = coordinator(50);

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let coord = coord.clone();
            thread::spawn(move || {
                let id = WorkerId::new(format!("writer-{}", t));
                for _ in 0..ROUNDS {
                    let range = coord.assign(&id).unwrap();
                    coord
                        .submit(RangeReport::completed(id.clone(), range, Vec::new()))
                        .expect("accepted");
                }
            })
        })
        .collect();

    let reader = {
        let coord = coord.clone();
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..ROUNDS * 4 {
                let now = coord.status().largest_prime_tested;
                assert!(now >= last, "largest_prime_tested went from {} to {}", last, now);
                last = now;
            }
        })
    };

    for w in writers {
        w.join().expect("writer panicked");
    }
    reader.join().expect("reader panicked");

    assert_eq!(coord.status().largest_prime_tested, 1 + 4 * ROUNDS as u64 * 50);
}
