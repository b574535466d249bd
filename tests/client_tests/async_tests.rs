//! Tests for the AsyncClient
//!
//! These tests verify:
//! - The async adapter sends the same bytes as the blocking one
//! - Retry and teardown follow the same policy
//! - Cancelling a request drops its connection
//! - Concurrent tasks never interleave on the connection

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use common::{closed_addr, MockServer, Reply};
use mcmeta::{ArithmeticOptions, AsyncClient, CasToken, ClientConfig, GetOptions, MetaError, Ttl};

fn client_for(server: &MockServer) -> AsyncClient {
    AsyncClient::new(server.config())
}

// =============================================================================
// Basic Operations
// =============================================================================

#[tokio::test]
async fn test_get_set_delete() {
    let server = MockServer::single(vec![
        Reply::send("HD\r\n"),
        Reply::send("VA 5 f0\r\nhello\r\n"),
        Reply::send("HD\r\n"),
        Reply::send("EN\r\n"),
    ]);
    let client = client_for(&server);

    client.set("k", "hello", Some(60)).await.unwrap();
    assert_eq!(client.get("k").await.unwrap(), Some(Bytes::from_static(b"hello")));
    client.delete("k").await.unwrap();
    assert_eq!(client.get("k").await.unwrap(), None);

    assert_eq!(
        server.requests(),
        vec![
            "ms k 5 F0 T60\r\nhello\r\n",
            "mg k f v\r\n",
            "md k\r\n",
            "mg k f v\r\n",
        ]
    );
}

#[tokio::test]
async fn test_get_with_metadata() {
    let server = MockServer::single(vec![Reply::send("VA 1 f0 c9 t15 h0\r\nx\r\n")]);
    let client = client_for(&server);

    let hit = client
        .get_with("k", GetOptions::new().cas().ttl().hit_before())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(hit.cas, Some(CasToken::new(9)));
    assert_eq!(hit.ttl, Some(Ttl::Remaining(15)));
    assert_eq!(hit.hit_before, Some(false));
    assert_eq!(hit.size, None);
}

#[tokio::test]
async fn test_gets_and_cas_conflict() {
    let server = MockServer::single(vec![
        Reply::send("VA 1 f0 c7\r\nv\r\n"),
        Reply::send("HD\r\n"),
        Reply::send("EX\r\n"),
    ]);
    let client = client_for(&server);

    let (_, token) = client.gets("k").await.unwrap().unwrap();
    client.cas("k", "v2", token, None).await.unwrap();

    match client.cas("k", "v3", token, None).await {
        Err(MetaError::CasConflict) => {}
        other => panic!("Expected CAS conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_counters() {
    let server = MockServer::single(vec![
        Reply::send("VA 1\r\n5\r\n"),
        Reply::send("VA 1\r\n0\r\n"),
        Reply::send("NF\r\n"),
    ]);
    let client = client_for(&server);

    assert_eq!(
        client
            .arithmetic("c", ArithmeticOptions::incr(5).vivify(0, 60))
            .await
            .unwrap(),
        5
    );
    assert_eq!(client.decr("c", 100).await.unwrap(), 0);
    assert!(matches!(client.incr("absent", 1).await, Err(MetaError::NotFound)));
}

#[tokio::test]
async fn test_flush_and_noop() {
    let server = MockServer::single(vec![Reply::send("OK\r\n"), Reply::send("MN\r\n")]);
    let client = client_for(&server);

    client.flush_all(None).await.unwrap();
    client.noop().await.unwrap();
    assert_eq!(server.requests(), vec!["flush_all\r\n", "mn\r\n"]);
}

#[tokio::test]
async fn test_get_many() {
    let server = MockServer::single(vec![
        Reply::send("EN\r\n"),
        Reply::send("VA 1 f0\r\nb\r\n"),
    ]);
    let client = client_for(&server);

    let hits = client.get_many(vec!["a", "b"]).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, Bytes::from_static(b"b"));
}

// =============================================================================
// Retry and Teardown
// =============================================================================

#[tokio::test]
async fn test_read_only_retried_once() {
    let server = MockServer::start(vec![
        vec![Reply::close_after("")],
        vec![Reply::send("VA 1 f0\r\nx\r\n")],
    ]);
    let client = client_for(&server);

    assert_eq!(client.get("k").await.unwrap(), Some(Bytes::from_static(b"x")));
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_mutation_not_retried() {
    let server = MockServer::start(vec![vec![Reply::close_after("")], vec![]]);
    let client = client_for(&server);

    match client.set("k", "v", None).await {
        Err(MetaError::Connection(_)) => {}
        other => panic!("Expected connection error, got {:?}", other),
    }
    assert_eq!(server.requests().len(), 1);
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn test_truncated_value_is_framing_error() {
    let server = MockServer::single(vec![Reply::close_after("VA 5 f0\r\nhe")]);
    let client = client_for(&server);

    assert!(matches!(client.get("k").await, Err(MetaError::Framing(_))));
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn test_server_error_keeps_connection() {
    let server = MockServer::single(vec![Reply::send("CLIENT_ERROR bad data chunk\r\n")]);
    let client = client_for(&server);

    assert!(matches!(client.set("k", "v", None).await, Err(MetaError::Server(_))));
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start(vec![vec![Reply::hang_after("")], vec![Reply::send("HD\r\n")]]);
    let config = ClientConfig::builder()
        .addr(server.addr())
        .request_timeout_ms(100)
        .build();
    let client = AsyncClient::new(config);

    match client.delete("k").await {
        Err(MetaError::Timeout(ms)) => assert_eq!(ms, 100),
        other => panic!("Expected timeout, got {:?}", other),
    }
    assert!(!client.is_connected().await);

    client.delete("k").await.unwrap();
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_timeout_inside_value_is_framing_error() {
    let server = MockServer::single(vec![Reply::hang_after("VA 8 f0\r\nabc")]);
    let config = ClientConfig::builder()
        .addr(server.addr())
        .request_timeout_ms(100)
        .build();
    let client = AsyncClient::new(config);

    assert!(matches!(client.get("k").await, Err(MetaError::Framing(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = AsyncClient::new(ClientConfig::for_addr(closed_addr()));
    match client.noop().await {
        Err(e) => assert!(e.is_connection_error(), "got {:?}", e),
        Ok(()) => panic!("Expected connection error"),
    }
}

// =============================================================================
// Cancellation and Concurrency
// =============================================================================

#[tokio::test]
async fn test_cancelled_request_drops_connection() {
    let server = MockServer::start(vec![vec![Reply::hang_after("")], vec![Reply::send("MN\r\n")]]);
    let config = ClientConfig::builder()
        .addr(server.addr())
        .request_timeout_ms(0)
        .build();
    let client = AsyncClient::new(config);

    let cancelled = tokio::time::timeout(Duration::from_millis(100), client.get("k")).await;
    assert!(cancelled.is_err());
    assert!(!client.is_connected().await);

    client.noop().await.unwrap();
    assert_eq!(server.connections(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_are_serialized() {
    let replies = (0..20).map(|_| Reply::send("HD\r\n")).collect();
    let server = MockServer::single(replies);
    let client = Arc::new(client_for(&server));

    let mut tasks = Vec::new();
    for i in 0..20 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            client.set(format!("key{}", i), "value", None).await
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let requests = server.requests();
    assert_eq!(requests.len(), 20);
    assert!(requests.iter().all(|r| r.ends_with(" 5 F0\r\nvalue\r\n")));
    assert_eq!(server.connections(), 1);
}
