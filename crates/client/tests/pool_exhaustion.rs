//! Capacity limits and the bounded acquire wait.

mod support;

use std::time::{Duration, Instant};

use tabstore_client::{Client, Error};

use support::MockServer;

#[tokio::test]
async fn acquire_times_out_when_the_only_connection_is_borrowed() {
    let server = MockServer::canned().await;
    let client = Client::connect(
        server
            .options()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(50))
            .retry_interval(Duration::from_millis(10)),
    )
    .await
    .unwrap();
    let pool = client.pool();

    let borrowed = pool.acquire().await.unwrap();
    let started = Instant::now();
    match pool.acquire().await {
        Err(Error::PoolExhausted { waited }) => {
            assert!(waited >= Duration::from_millis(50), "waited {waited:?}");
        }
        other => panic!("expected PoolExhausted, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(pool.live_count(), 1, "failed waiters must not leak slots");

    // Capacity frees up; the next acquire succeeds without dialing.
    let dials = server.dial_count();
    pool.release(borrowed, true).await;
    let conn = pool.acquire().await.unwrap();
    assert_eq!(server.dial_count(), dials);
    pool.release(conn, true).await;
}

#[tokio::test]
async fn waiter_wins_when_a_connection_is_released_in_time() {
    let server = MockServer::canned().await;
    let client = Client::connect(
        server
            .options()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(500))
            .retry_interval(Duration::from_millis(10)),
    )
    .await
    .unwrap();
    let pool = client.pool().clone();

    let borrowed = pool.acquire().await.unwrap();
    let releaser = {
        let pool = pool.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            pool.release(borrowed, true).await;
        })
    };

    let conn = pool.acquire().await.unwrap();
    assert_eq!(pool.live_count(), 1);
    pool.release(conn, true).await;
    releaser.await.unwrap();
}

#[tokio::test]
async fn pool_stays_within_capacity_under_load() {
    let server = MockServer::canned().await;
    let client = Client::connect(server.options().max_connections(2))
        .await
        .unwrap();
    let pool = client.pool();

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    assert_eq!(pool.live_count(), 2);
    assert_eq!(server.dial_count(), 2);

    pool.release(a, true).await;
    pool.release(b, true).await;
    assert_eq!(pool.idle_count(), 2);
}
