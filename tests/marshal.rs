//! Integration tests for the owner-thread marshal under concurrent load.

use commandeer::{Marshal, MarshalError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;
const PER_THREAD: usize = 200;

#[test]
fn test_fifo_per_submitter_and_no_overlap() {
    let (marshal, owner) = Marshal::spawn("fifo").unwrap();
    let log = Arc::new(Mutex::new(Vec::with_capacity(THREADS * PER_THREAD)));
    let running = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let submitters: Vec<_> = (0..THREADS)
        .map(|t| {
            let marshal = marshal.clone();
            let log = Arc::clone(&log);
            let running = Arc::clone(&running);
            let overlaps = Arc::clone(&overlaps);
            thread::spawn(move || {
                for seq in 0..PER_THREAD {
                    let log = Arc::clone(&log);
                    let running = Arc::clone(&running);
                    let overlaps = Arc::clone(&overlaps);
                    marshal
                        .submit(move || {
                            if running.swap(true, Ordering::SeqCst) {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            log.lock().push((t, seq, thread::current().id()));
                            running.store(false, Ordering::SeqCst);
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in submitters {
        handle.join().unwrap();
    }
    marshal
        .submit_blocking(|| (), Duration::from_secs(10))
        .unwrap();

    let log = log.lock();
    assert_eq!(log.len(), THREADS * PER_THREAD);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);

    let owner_id = log[0].2;
    assert_ne!(owner_id, thread::current().id());
    assert!(log.iter().all(|(_, _, id)| *id == owner_id));

    for t in 0..THREADS {
        let seqs: Vec<_> = log
            .iter()
            .filter(|(thread, _, _)| *thread == t)
            .map(|(_, seq, _)| *seq)
            .collect();
        assert_eq!(seqs, (0..PER_THREAD).collect::<Vec<_>>(), "submitter {t}");
    }
    drop(log);

    drop(marshal);
    owner.join().unwrap();
}

#[test]
fn test_blocking_callers_from_many_threads() {
    let (marshal, owner) = Marshal::spawn("blocking-many").unwrap();
    let counter = Arc::new(Mutex::new(0u64));

    let callers: Vec<_> = (0..THREADS)
        .map(|_| {
            let marshal = marshal.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                (0..50)
                    .map(|_| {
                        let counter = Arc::clone(&counter);
                        marshal
                            .submit_blocking(
                                move || {
                                    let mut value = counter.lock();
                                    *value += 1;
                                    *value
                                },
                                Duration::from_secs(10),
                            )
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen: Vec<u64> = callers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (1..=(THREADS as u64 * 50)).collect::<Vec<_>>());

    drop(marshal);
    owner.join().unwrap();
}

#[test]
fn test_timeout_then_late_completion() {
    let (marshal, owner) = Marshal::spawn("late").unwrap();
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);

    let result = marshal.submit_blocking(
        move || {
            thread::sleep(Duration::from_millis(200));
            flag.store(true, Ordering::SeqCst);
        },
        Duration::from_millis(20),
    );
    assert_eq!(result, Err(MarshalError::Timeout(Duration::from_millis(20))));
    assert!(!done.load(Ordering::SeqCst));

    // Queued behind the slow action.
    marshal
        .submit_blocking(|| (), Duration::from_secs(5))
        .unwrap();
    assert!(done.load(Ordering::SeqCst));

    drop(marshal);
    owner.join().unwrap();
}

#[tokio::test]
async fn test_async_submissions_complete_in_order() {
    let (marshal, owner) = Marshal::spawn("async-order").unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let order = Arc::clone(&order);
            marshal.submit_async(move || {
                order.lock().push(i);
                i * 2
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await, Ok(i * 2));
    }
    assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());

    drop(marshal);
    tokio::task::spawn_blocking(move || owner.join().unwrap())
        .await
        .unwrap();
}
