use pairly_services::{DistributedLock, InviteError, LocalLock, LockError, with_lock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn local_lock_times_out_while_held() {
    let lock = LocalLock::with_timeout(Duration::from_millis(50));

    let lease = lock.acquire("invite:abc").await.unwrap();
    assert_eq!(lease.resource(), "invite:abc");
    assert!(lease.is_local());

    let err = lock.acquire("invite:abc").await.unwrap_err();
    match err {
        LockError::Timeout { resource, waited_ms } => {
            assert_eq!(resource, "invite:abc");
            assert_eq!(waited_ms, 50);
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    assert!(lock.release(lease).await.unwrap());
    let again = lock.acquire("invite:abc").await.unwrap();
    lock.release(again).await.unwrap();
}

#[tokio::test]
async fn local_lock_forgets_idle_resources() {
    let lock = LocalLock::with_timeout(Duration::from_millis(50));

    let a = lock.acquire("a").await.unwrap();
    let b = lock.acquire("b").await.unwrap();
    assert_eq!(lock.tracked(), 2);

    lock.release(a).await.unwrap();
    lock.release(b).await.unwrap();
    assert_eq!(lock.tracked(), 0);
}

#[tokio::test]
async fn dropped_lease_frees_local_lock() {
    let lock = LocalLock::with_timeout(Duration::from_millis(50));

    let lease = lock.acquire("r").await.unwrap();
    drop(lease);
    assert_eq!(lock.tracked(), 0);

    let lease = lock.acquire("r").await.unwrap();
    lock.release(lease).await.unwrap();
}

#[tokio::test]
async fn cancelled_critical_section_leaves_no_entry() {
    let lock = Arc::new(LocalLock::with_timeout(Duration::from_millis(50)));

    let holder = {
        let lock = lock.clone();
        tokio::spawn(async move {
            let _: Result<(), InviteError> = with_lock(lock.as_ref(), "abandoned", || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(lock.tracked(), 1);

    holder.abort();
    assert!(holder.await.unwrap_err().is_cancelled());
    assert_eq!(lock.tracked(), 0);

    let lease = lock.acquire("abandoned").await.unwrap();
    lock.release(lease).await.unwrap();
}

#[tokio::test]
async fn timed_out_waiter_does_not_pin_entry() {
    let lock = LocalLock::with_timeout(Duration::from_millis(20));

    let held = lock.acquire("r").await.unwrap();
    assert!(lock.acquire("r").await.is_err());
    assert_eq!(lock.tracked(), 1);

    drop(held);
    assert_eq!(lock.tracked(), 0);
}

#[tokio::test]
async fn with_lock_releases_after_error() {
    let lock = LocalLock::with_timeout(Duration::from_millis(50));

    let result: Result<(), InviteError> = with_lock(&lock, "r", || async {
        Err(InviteError::Validation("boom".to_string()))
    })
    .await;
    assert!(matches!(result, Err(InviteError::Validation(_))));

    let value: Result<u32, InviteError> = with_lock(&lock, "r", || async { Ok(7) }).await;
    assert_eq!(value.unwrap(), 7);
    assert_eq!(lock.tracked(), 0);
}

#[tokio::test]
async fn with_lock_surfaces_acquire_timeout() {
    let lock = LocalLock::with_timeout(Duration::from_millis(30));
    let held = lock.acquire("r").await.unwrap();
    let counter = AtomicUsize::new(0);
    let ran = &counter;

    let result: Result<(), InviteError> = with_lock(&lock, "r", move || async move {
        ran.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    assert!(matches!(result, Err(InviteError::Lock(LockError::Timeout { .. }))));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    lock.release(held).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn with_lock_serializes_critical_sections() {
    let lock = Arc::new(LocalLock::with_timeout(Duration::from_secs(5)));
    let inside = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let lock = lock.clone();
        let inside = inside.clone();
        let max_seen = max_seen.clone();
        handles.push(tokio::spawn(async move {
            let result: Result<(), InviteError> = with_lock(lock.as_ref(), "shared", move || async move {
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
            result.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
}
