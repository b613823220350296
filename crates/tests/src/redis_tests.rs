//! Same behaviour against a live Redis. Run with `--ignored` when one is available.

use pairly_services::{DistributedLock, JoinOutcome, JoinStatus, KeyValueStore, LockError, Role};
use std::time::Duration;

use crate::fixtures::test_coordinator::RedisTestCoordinator;

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_full_pairing_flow() {
    let app = RedisTestCoordinator::spawn().await;

    let invite = app.service.create_invite("alice", None).await.unwrap();
    let id = &invite.invite_id;

    let mut conn = app.conn.clone();
    let ttl: i64 = redis::cmd("TTL")
        .arg(app.invite_key(id))
        .query_async(&mut conn)
        .await
        .unwrap();
    assert!(ttl > 24 * 60 * 60 - 5 && ttl <= 24 * 60 * 60);

    assert_eq!(
        app.service.join_invite(id, "alice").await.unwrap().status(),
        JoinStatus::Pending
    );
    let bob = app.service.join_invite(id, "bob").await.unwrap();
    assert_eq!(bob.role(), Some(Role::Invitee));
    assert_eq!(bob.partner_key(), Some("alice"));
    assert_eq!(
        app.service.join_invite(id, "alice").await.unwrap().partner_key(),
        Some("bob")
    );
    assert_eq!(app.service.join_invite(id, "carol").await.unwrap(), JoinOutcome::Used);

    let reissued = app.service.reissue_invite(id, "alice").await.unwrap();
    assert!(reissued.is_ok());
    assert_eq!(app.service.join_invite(id, "dave").await.unwrap(), JoinOutcome::Absent);
    assert!(app.store.get(&app.invite_key(id)).await.unwrap().is_none());

    let new_id = reissued.invite_id().unwrap().to_string();
    assert!(app.service.revoke_invite(&new_id, "alice").await.unwrap().is_ok());
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_logical_expiry_precedes_physical() {
    let app = RedisTestCoordinator::spawn().await;
    let invite = app
        .service
        .create_invite("alice", Some(Duration::from_millis(100)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(app.service.get_invite(&invite.invite_id).await.unwrap().is_some());
    assert_eq!(
        app.service.join_invite(&invite.invite_id, "bob").await.unwrap(),
        JoinOutcome::Expired
    );
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_lock_times_out_and_releases() {
    let mut app = RedisTestCoordinator::spawn().await;
    app.settings.lock.acquire_timeout_ms = 100;
    let lock = pairly_services::RedisLock::new(app.conn.clone(), &app.settings.lock);

    let lease = app.lock.acquire("held").await.unwrap();
    assert!(matches!(lock.acquire("held").await, Err(LockError::Timeout { .. })));
    assert!(app.lock.release(lease).await.unwrap());

    let lease = lock.acquire("resource").await.unwrap();
    let err = lock.acquire("resource").await.unwrap_err();
    assert!(matches!(err, LockError::Timeout { .. }));

    assert!(lock.release(lease).await.unwrap());
    let again = lock.acquire("resource").await.unwrap();
    assert!(lock.release(again).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_stale_lease_does_not_release_new_holder() {
    let mut app = RedisTestCoordinator::spawn().await;
    app.settings.lock.lease_ms = 100;
    app.settings.lock.acquire_timeout_ms = 1_000;
    let lock = pairly_services::RedisLock::new(app.conn.clone(), &app.settings.lock);

    let stale = lock.acquire("resource").await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // The first lease lapsed; a second holder takes over.
    let current = lock.acquire("resource").await.unwrap();
    assert!(!lock.release(stale).await.unwrap());

    let mut conn = app.conn.clone();
    let holder: Option<String> = redis::cmd("GET")
        .arg(lock.key("resource"))
        .query_async(&mut conn)
        .await
        .unwrap();
    assert_eq!(holder.as_deref(), Some(current.token()));

    assert!(lock.release(current).await.unwrap());
}
