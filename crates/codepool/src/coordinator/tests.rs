use core::time::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use bytes::Bytes;

use crate::store::tests::{ContendedStore, FaultyStore, YieldingStore, seeded};
use crate::{
    Coordinator, KvStore, MemoryStore, PopError, PopStatus, QueueStore, RetryPolicy, StoreError,
    TokioYield,
};

fn codes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("CODE-{i:04}")).collect()
}

fn patient() -> RetryPolicy {
    RetryPolicy::new(10_000, Duration::ZERO, Duration::ZERO)
}

async fn remaining<S: KvStore>(coordinator: &Coordinator<S>) -> Vec<String> {
    coordinator
        .queue()
        .read()
        .await
        .unwrap()
        .map(|snapshot| snapshot.pool.into_iter().collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn pops_in_insertion_order_until_empty() {
    let queue = seeded(MemoryStore::new(), &["A", "B", "C"]).await;
    let coordinator = Coordinator::new(queue, RetryPolicy::default());

    assert_eq!(coordinator.pop_code::<TokioYield>().await.unwrap(), "A");
    assert_eq!(remaining(&coordinator).await, ["B", "C"]);
    assert_eq!(coordinator.pop_code::<TokioYield>().await.unwrap(), "B");
    assert_eq!(coordinator.pop_code::<TokioYield>().await.unwrap(), "C");

    for _ in 0..3 {
        assert!(matches!(
            coordinator.pop_code::<TokioYield>().await,
            Err(PopError::Empty)
        ));
    }
}

#[tokio::test]
async fn each_pop_removes_exactly_the_head() {
    let all = codes(10);
    let queue = QueueStore::new(MemoryStore::new(), "codes");
    queue
        .replace(&crate::CodePool::new(all.clone()).unwrap())
        .await
        .unwrap();
    let coordinator = Coordinator::new(queue, RetryPolicy::default());

    let mut before = remaining(&coordinator).await;
    while !before.is_empty() {
        let popped = coordinator.pop_code::<TokioYield>().await.unwrap();
        let after = remaining(&coordinator).await;
        assert_eq!(after.len(), before.len() - 1);
        assert_eq!(before[0], popped);
        assert_eq!(before[1..], after[..]);
        before = after;
    }
}

#[tokio::test]
async fn absent_pool_is_empty() {
    let coordinator = Coordinator::new(
        QueueStore::new(MemoryStore::new(), "codes"),
        RetryPolicy::default(),
    );
    assert!(matches!(coordinator.try_pop().await, Err(PopError::Empty)));
    assert!(matches!(
        coordinator.pop_code::<TokioYield>().await,
        Err(PopError::Empty)
    ));
}

#[tokio::test]
async fn empty_array_is_empty() {
    let queue = seeded(MemoryStore::new(), &[]).await;
    let coordinator = Coordinator::new(queue, RetryPolicy::default());
    assert!(matches!(
        coordinator.pop_code::<TokioYield>().await,
        Err(PopError::Empty)
    ));
}

#[tokio::test]
async fn malformed_pool_is_a_store_fault() {
    let store = MemoryStore::new();
    store
        .put("codes", Bytes::from_static(b"\"A,B,C\""), None)
        .await
        .unwrap();
    let coordinator = Coordinator::new(QueueStore::new(store, "codes"), RetryPolicy::default());

    let err = coordinator.pop_code::<TokioYield>().await.unwrap_err();
    assert!(matches!(
        err,
        PopError::Store(StoreError::Malformed { .. })
    ));
    assert!(!err.is_transient());

    // the bad value is left for an operator to inspect
    let entry = coordinator.queue().store().get("codes").await.unwrap().unwrap();
    assert_eq!(entry.value, &b"\"A,B,C\""[..]);
}

#[tokio::test]
async fn repeated_code_is_never_dispensed_twice() {
    let store = MemoryStore::new();
    store
        .put("codes", Bytes::from_static(br#"["A","A","B"]"#), None)
        .await
        .unwrap();
    let coordinator = Coordinator::new(QueueStore::new(store, "codes"), RetryPolicy::default());

    for _ in 0..2 {
        assert!(matches!(
            coordinator.pop_code::<TokioYield>().await,
            Err(PopError::Store(StoreError::Duplicate { ref code, .. })) if code == "A"
        ));
    }
    let entry = coordinator.queue().store().get("codes").await.unwrap().unwrap();
    assert_eq!(entry.value, &br#"["A","A","B"]"#[..]);
}

#[tokio::test]
async fn failed_write_consumes_nothing() {
    let queue = seeded(FaultyStore::default(), &["A", "B"]).await;
    let coordinator = Coordinator::new(queue, RetryPolicy::default());

    coordinator
        .queue()
        .store()
        .fail_puts
        .store(true, Ordering::SeqCst);
    assert!(matches!(
        coordinator.pop_code::<TokioYield>().await,
        Err(PopError::Store(StoreError::Unavailable { .. }))
    ));

    coordinator
        .queue()
        .store()
        .fail_puts
        .store(false, Ordering::SeqCst);
    assert_eq!(remaining(&coordinator).await, ["A", "B"]);
    assert_eq!(coordinator.pop_code::<TokioYield>().await.unwrap(), "A");
}

#[tokio::test]
async fn failed_read_is_a_store_fault() {
    let queue = seeded(FaultyStore::default(), &["A"]).await;
    let coordinator = Coordinator::new(queue, RetryPolicy::default());
    coordinator
        .queue()
        .store()
        .fail_gets
        .store(true, Ordering::SeqCst);
    assert!(matches!(
        coordinator.try_pop().await,
        Err(PopError::Store(StoreError::Unavailable { .. }))
    ));
}

#[tokio::test]
async fn single_attempt_reports_conflict() {
    let queue = seeded(ContendedStore::default(), &["A", "B"]).await;
    let coordinator = Coordinator::new(queue, RetryPolicy::default());
    let read_at = coordinator.queue().read().await.unwrap().unwrap().version;

    coordinator.queue().store().set_rivals(1);
    assert_eq!(
        coordinator.try_pop().await.unwrap(),
        PopStatus::Conflict { read_at }
    );
    assert_eq!(remaining(&coordinator).await, ["A", "B"]);
}

#[tokio::test]
async fn conflicts_are_retried_from_a_fresh_read() {
    let queue = seeded(ContendedStore::default(), &["A", "B"]).await;
    let coordinator = Coordinator::new(queue, RetryPolicy::default());
    let puts_before = coordinator.queue().store().puts();

    coordinator.queue().store().set_rivals(2);
    assert_eq!(coordinator.pop_code::<TokioYield>().await.unwrap(), "A");
    assert_eq!(coordinator.queue().store().puts() - puts_before, 3);
    assert_eq!(remaining(&coordinator).await, ["B"]);
}

#[tokio::test]
async fn gives_up_after_max_attempts_and_keeps_the_pool() {
    let queue = seeded(ContendedStore::default(), &["A", "B"]).await;
    let policy = RetryPolicy::new(5, Duration::ZERO, Duration::ZERO);
    let coordinator = Coordinator::new(queue, policy);
    let puts_before = coordinator.queue().store().puts();

    coordinator.queue().store().set_rivals(usize::MAX);
    let err = coordinator.pop_code::<TokioYield>().await.unwrap_err();
    assert!(matches!(err, PopError::RaceLost { attempts: 5 }));
    assert!(err.is_transient());
    assert_eq!(coordinator.queue().store().puts() - puts_before, 5);

    coordinator.queue().store().set_rivals(0);
    assert_eq!(remaining(&coordinator).await, ["A", "B"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pops_dispense_every_code_once() {
    let all = codes(64);
    let queue = QueueStore::new(YieldingStore::default(), "codes");
    queue
        .replace(&crate::CodePool::new(all.clone()).unwrap())
        .await
        .unwrap();
    let coordinator = Arc::new(Coordinator::new(queue, patient()));

    let handles: Vec<_> = (0..all.len())
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.pop_code::<TokioYield>().await })
        })
        .collect();

    let mut dispensed = Vec::with_capacity(all.len());
    for handle in handles {
        dispensed.push(handle.await.unwrap().unwrap());
    }

    let unique: HashSet<_> = dispensed.iter().cloned().collect();
    assert_eq!(unique.len(), all.len());
    assert_eq!(unique, all.into_iter().collect::<HashSet<_>>());
    assert!(matches!(
        coordinator.pop_code::<TokioYield>().await,
        Err(PopError::Empty)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contention_never_duplicates_or_loses_codes() {
    let all = codes(100);
    let queue = QueueStore::new(YieldingStore::default(), "codes");
    queue
        .replace(&crate::CodePool::new(all.clone()).unwrap())
        .await
        .unwrap();
    let policy = RetryPolicy::new(5, Duration::ZERO, Duration::from_micros(50));
    let coordinator = Arc::new(Coordinator::new(queue, policy));

    let handles: Vec<_> = (0..200)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.pop_code::<TokioYield>().await })
        })
        .collect();

    let mut dispensed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(code) => dispensed.push(code),
            Err(PopError::Empty | PopError::RaceLost { .. }) => {}
            Err(e) => panic!("unexpected pop error: {e}"),
        }
    }

    let unique: HashSet<_> = dispensed.iter().cloned().collect();
    assert_eq!(unique.len(), dispensed.len(), "a code was dispensed twice");

    let left = remaining(&coordinator).await;
    assert!(left.iter().all(|code| !unique.contains(code)));
    let mut accounted: Vec<_> = dispensed.into_iter().chain(left).collect();
    accounted.sort();
    assert_eq!(accounted, all, "a code was lost");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn last_code_goes_to_exactly_one_of_two_racers() {
    for _ in 0..50 {
        let queue = seeded(YieldingStore::default(), &["ONLY"]).await;
        let coordinator = Arc::new(Coordinator::new(queue, RetryPolicy::default()));

        let left = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move { coordinator.pop_code::<TokioYield>().await }
        });
        let right = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move { coordinator.pop_code::<TokioYield>().await }
        });
        let results = [left.await.unwrap(), right.await.unwrap()];

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners, [&"ONLY".to_string()]);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(PopError::Empty | PopError::RaceLost { .. })
        )));
    }
}

#[test]
fn backoff_grows_and_is_capped() {
    let policy = RetryPolicy::new(5, Duration::from_millis(10), Duration::from_millis(50));
    assert_eq!(policy.ceiling(1), Duration::from_millis(10));
    assert_eq!(policy.ceiling(2), Duration::from_millis(20));
    assert_eq!(policy.ceiling(3), Duration::from_millis(40));
    assert_eq!(policy.ceiling(4), Duration::from_millis(50));
    assert_eq!(policy.ceiling(u32::MAX), Duration::from_millis(50));

    for attempt in 1..=6 {
        assert!(policy.backoff(attempt) <= policy.ceiling(attempt));
    }
}

#[test]
fn policy_is_normalized() {
    let policy = RetryPolicy::new(0, Duration::from_millis(20), Duration::from_millis(5));
    assert_eq!(policy.max_attempts(), 1);
    assert_eq!(policy.max_delay(), Duration::from_millis(20));
    assert_eq!(RetryPolicy::default().max_attempts(), 5);
}
