//! Multiplexing integration tests
//!
//! Many calls share one connection; responses come back in whatever order the
//! server finishes them and must still reach the right caller.

mod common;

use common::{mock_response, MockWsServer, Reply};
use rpcall_client::{PreCallHook, WsClient};
use rpcall_core::{Error, ErrorKind};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

async fn connected(server: &MockWsServer) -> WsClient {
    let client = WsClient::new(server.url());
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn test_concurrent_calls_overlap() {
    let server = MockWsServer::start().await;
    let client = connected(&server).await;
    let started = Instant::now();

    let slow_params = json!([1.0]);
    let fast_params = json!([0.8]);
    let (slow, fast) = tokio::join!(
        client.call_with("wait", &slow_params),
        client.call_with("wait", &fast_params),
    );

    assert_eq!(slow.unwrap(), json!(1.0));
    assert_eq!(fast.unwrap(), json!(0.8));
    assert!(
        started.elapsed() < Duration::from_millis(1500),
        "calls ran sequentially: {:?}",
        started.elapsed()
    );
    assert_eq!(client.pending_count(), 0);

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_out_of_order_responses_reach_their_callers() {
    let server = MockWsServer::start().await;
    let client = connected(&server).await;

    // Later calls finish first
    let calls = (0..10).map(|i| {
        let client = client.clone();
        tokio::spawn(async move {
            let seconds = 0.05 * (10 - i) as f64;
            let result = client.call_with("wait", &json!([seconds])).await.unwrap();
            (seconds, result)
        })
    });

    for call in futures::future::join_all(calls).await {
        let (sent, received) = call.unwrap();
        assert_eq!(received, json!(sent));
    }
    assert_eq!(client.ids().outstanding_count(), 0);

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let mut server = MockWsServer::start().await;
    let client = connected(&server).await;

    let a_params = json!(["a"]);
    let b_params = json!(["b"]);
    let c_params = json!(["c"]);
    let (a, b, c) = tokio::join!(
        client.call_with("echo", &a_params),
        client.call_with("echo", &b_params),
        client.call_with("echo", &c_params),
    );
    assert_eq!(a.unwrap(), json!(["a"]));
    assert_eq!(b.unwrap(), json!(["b"]));
    assert_eq!(c.unwrap(), json!(["c"]));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let message: Value = serde_json::from_str(&server.wait_for_message().await.unwrap()).unwrap();
        assert_eq!(message["jsonrpc"], "2.0");
        ids.push(message["id"].as_u64().unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| *id > 0));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_noise_is_dropped() {
    let server = MockWsServer::start().await;
    let client = connected(&server).await;

    // Non-JSON, an unmatched id and an id-less response arrive before the real answer
    let result = client.call_with("noise", &json!({"ok": 1})).await.unwrap();
    assert_eq!(result, json!({"ok": 1}));

    // The connection survives
    let result = client.call_with("echo", &json!([2])).await.unwrap();
    assert_eq!(result, json!([2]));
    assert_eq!(client.pending_count(), 0);
    assert!(client.is_connected());

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_timeout_releases_the_call() {
    let server = MockWsServer::start().await;
    let client = connected(&server).await;

    let result = client
        .call_with_timeout("silent", None, Duration::from_millis(100))
        .await;

    assert!(matches!(result, Err(Error::Timeout)));
    assert_eq!(client.pending_count(), 0);
    assert_eq!(client.ids().outstanding_count(), 0);

    // Still usable
    assert_eq!(client.call_with("echo", &json!([3])).await.unwrap(), json!([3]));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_late_response_after_timeout_is_dropped() {
    let server = MockWsServer::start().await;
    let client = connected(&server).await;

    let result = client
        .call_with_timeout("wait", Some(vec![json!(0.3)].into()), Duration::from_millis(50))
        .await;
    assert!(matches!(result, Err(Error::Timeout)));

    // Let the late answer arrive and be discarded
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(client.pending_count(), 0);
    assert_eq!(client.call_with("echo", &json!([4])).await.unwrap(), json!([4]));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_default_timeout_from_builder() {
    let server = MockWsServer::start().await;
    let client = WsClient::builder(server.url())
        .request_timeout(Duration::from_millis(100))
        .connect()
        .await
        .unwrap();

    assert!(matches!(client.call("silent", None).await, Err(Error::Timeout)));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_error_classification() {
    let server = MockWsServer::start().await;
    let client = WsClient::builder(server.url())
        .with_server_error(-32001, "InsufficientFunds")
        .connect()
        .await
        .unwrap();

    let err = client
        .call_with("fail", &json!([-32001, "balance too low"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(&ErrorKind::Custom("InsufficientFunds".into())));
    assert_eq!(err.code(), Some(-32001));

    let err = client.call_with("fail", &json!([-32050, "busy"])).await.unwrap_err();
    assert_eq!(err.kind(), Some(&ErrorKind::ServerError));

    let err = client.call("no_such_method", None).await.unwrap_err();
    assert_eq!(err.kind(), Some(&ErrorKind::MethodNotFound));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_binary_frames_are_interpreted() {
    let server = MockWsServer::with_handler(|text| async move {
        let request: Value = serde_json::from_str(&text).unwrap();
        let id = request["id"].as_i64().unwrap();
        vec![Reply::Binary(mock_response(id, json!("binary frame")).into_bytes())]
    })
    .await;
    let client = connected(&server).await;

    assert_eq!(client.call("anything", None).await.unwrap(), json!("binary frame"));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_hooks_run_before_each_call() {
    let server = MockWsServer::start().await;
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let client = WsClient::builder(server.url())
        .with_hook(PreCallHook::asynchronous(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }))
        .connect()
        .await
        .unwrap();

    client.call_with("echo", &json!([1])).await.unwrap();
    client.call_with("echo", &json!([2])).await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_failing_hook_stops_the_call() {
    let mut server = MockWsServer::start().await;
    let client = WsClient::builder(server.url())
        .with_hook(PreCallHook::blocking(|| Err("token refresh failed".into())))
        .connect()
        .await
        .unwrap();

    let result = client.call("echo", None).await;
    assert!(matches!(result, Err(Error::Hook(_))));
    assert_eq!(client.pending_count(), 0);
    assert_eq!(client.ids().outstanding_count(), 0);

    // Nothing reached the server
    client.hooks().clear();
    client.call_with("echo", &json!(["after"])).await.unwrap();
    let first: Value = serde_json::from_str(&server.wait_for_message().await.unwrap()).unwrap();
    assert_eq!(first["params"], json!(["after"]));

    client.close().await;
    server.shutdown().await;
}
