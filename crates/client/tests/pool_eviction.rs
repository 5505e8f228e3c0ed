//! Idle-timeout eviction.

mod support;

use std::time::Duration;

use pretty_assertions::assert_eq;
use tabstore_client::Client;

use support::MockServer;

#[tokio::test]
async fn expired_idle_connections_are_evicted() {
    let server = MockServer::canned().await;
    let client = Client::connect(
        server
            .options()
            .max_connections(2)
            .idle_timeout(Duration::from_millis(50)),
    )
    .await
    .unwrap();
    let pool = client.pool();
    assert_eq!(pool.idle_count(), 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    pool.evict_idle_expired().await;

    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.live_count(), 0);
}

#[tokio::test]
async fn eviction_stops_at_the_first_fresh_connection() {
    let server = MockServer::canned().await;
    let client = Client::connect(
        server
            .options()
            .max_connections(2)
            .idle_timeout(Duration::from_millis(80)),
    )
    .await
    .unwrap();
    let pool = client.pool();

    // Let both pre-warmed connections age past the timeout, then
    // refresh one by cycling it through a borrow.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let refreshed = pool.acquire().await.unwrap();
    let refreshed_id = refreshed.id();
    pool.release(refreshed, true).await;

    pool.evict_idle_expired().await;

    assert_eq!(pool.idle_count(), 1);
    assert_eq!(pool.live_count(), 1);
    let survivor = pool.acquire().await.unwrap();
    assert_eq!(survivor.id(), refreshed_id);
    pool.release(survivor, true).await;
}

#[tokio::test]
async fn unexpired_connections_are_left_alone() {
    let server = MockServer::canned().await;
    let client = Client::connect(
        server
            .options()
            .max_connections(2)
            .idle_timeout(Duration::from_secs(60)),
    )
    .await
    .unwrap();
    let pool = client.pool();

    pool.evict_idle_expired().await;
    assert_eq!(pool.idle_count(), 2);
    assert_eq!(pool.live_count(), 2);
}
