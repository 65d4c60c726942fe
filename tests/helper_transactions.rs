//! Helper connection over real TCP
//!
//! Each test binds the service on an ephemeral port and plays the helper:
//! connect in, read request lines, write response and event lines.

use std::sync::Arc;
use std::time::Duration;

use findmy_bridge::events::{self, BridgeEvent};
use findmy_bridge::helper::{HelperError, HelperRpc, HelperService};
use findmy_bridge::FriendLocationCache;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

struct Harness {
    service: Arc<HelperService>,
    cache: Arc<FriendLocationCache>,
    events: broadcast::Receiver<BridgeEvent>,
    port: u16,
}

async fn start(timeout: Duration) -> Harness {
    let cache = Arc::new(FriendLocationCache::new());
    let (tx, rx) = events::channel();
    let service = Arc::new(HelperService::new(Arc::clone(&cache), tx, timeout));

    let listener = HelperService::bind(0).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(Arc::clone(&service).serve(listener));

    Harness {
        service,
        cache,
        events: rx,
        port,
    }
}

struct FakeHelper {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl FakeHelper {
    async fn connect(harness: &Harness) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", harness.port)).await.unwrap();
        let (reader, writer) = stream.into_split();
        let helper = Self {
            lines: BufReader::new(reader).lines(),
            writer,
        };
        wait_until(|| harness.service.is_connected()).await;
        helper
    }

    async fn next_request(&mut self) -> Value {
        let line = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn send(&mut self, value: Value) {
        let mut line = value.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

// =============================================================================
// Test 1: request / response
// =============================================================================

#[tokio::test]
async fn test_round_trip() {
    let harness = start(Duration::from_secs(5)).await;
    let mut helper = FakeHelper::connect(&harness).await;

    let service = Arc::clone(&harness.service);
    let call = tokio::spawn(async move {
        service
            .send_request("refresh-findmy-friends", json!({}))
            .await
    });

    let request = helper.next_request().await;
    assert_eq!(request["action"], "refresh-findmy-friends");
    assert_eq!(request["data"], json!({}));
    let id = request["transactionId"].as_str().unwrap().to_string();

    helper
        .send(json!({"transactionId": id, "locations": [{"handle": "a@x.com"}]}))
        .await;

    let result = call.await.unwrap().unwrap();
    assert_eq!(result.data, json!({"locations": [{"handle": "a@x.com"}]}));
    assert_eq!(harness.service.pending_transactions(), 0);
}

#[tokio::test]
async fn test_helper_error_response() {
    let harness = start(Duration::from_secs(5)).await;
    let mut helper = FakeHelper::connect(&harness).await;

    let service = Arc::clone(&harness.service);
    let call = tokio::spawn(async move {
        service
            .send_request("get-contact-for-handle", json!({"address": "a@x.com"}))
            .await
    });

    let request = helper.next_request().await;
    helper
        .send(json!({"transactionId": request["transactionId"], "error": "Contact not found"}))
        .await;

    match call.await.unwrap() {
        Err(HelperError::Helper { message, .. }) => assert_eq!(message, "Contact not found"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_removes_pending() {
    let harness = start(Duration::from_millis(100)).await;
    let mut helper = FakeHelper::connect(&harness).await;

    let err = harness
        .service
        .send_request("refresh-findmy-friends", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, HelperError::Timeout { after_ms: 100, .. }));
    assert_eq!(harness.service.pending_transactions(), 0);

    // a late answer is dropped without effect
    let request = helper.next_request().await;
    helper
        .send(json!({"transactionId": request["transactionId"], "data": {}}))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.service.pending_transactions(), 0);
}

#[tokio::test]
async fn test_disconnect_rejects_pending() {
    let harness = start(Duration::from_secs(5)).await;
    let mut helper = FakeHelper::connect(&harness).await;

    let service = Arc::clone(&harness.service);
    let call = tokio::spawn(async move { service.send_request("get-handle-siblings", json!({})).await });

    helper.next_request().await;
    drop(helper);

    assert!(matches!(call.await.unwrap(), Err(HelperError::Disconnected)));
    wait_until(|| !harness.service.is_connected()).await;
}

#[tokio::test]
async fn test_invalid_utf8_line_keeps_connection() {
    let harness = start(Duration::from_secs(5)).await;
    let mut helper = FakeHelper::connect(&harness).await;

    let service = Arc::clone(&harness.service);
    let call = tokio::spawn(async move { service.send_request("get-handle-siblings", json!({})).await });

    let request = helper.next_request().await;
    helper.send_raw(b"{\"event\":\"ping\",\"data\":\"\xff\xfe\"}\n").await;
    helper
        .send(json!({"transactionId": request["transactionId"], "data": ["b@x.com"]}))
        .await;

    let result = call.await.unwrap().unwrap();
    assert_eq!(result.data, json!(["b@x.com"]));
    assert!(harness.service.is_connected());
}

// =============================================================================
// Test 2: push events
// =============================================================================

#[tokio::test]
async fn test_location_event_updates_cache_and_broadcasts() {
    let mut harness = start(Duration::from_secs(5)).await;
    let mut helper = FakeHelper::connect(&harness).await;

    helper
        .send(json!({
            "event": "new-findmy-location",
            "data": [
                {"handle": "a@x.com", "coordinates": [1.0, 2.0], "last_updated": 100, "status": "live"},
                {"handle": "b@x.com", "coordinates": [3.0, 4.0], "last_updated": 100, "status": "legacy"}
            ]
        }))
        .await;

    let event = tokio::time::timeout(Duration::from_secs(2), harness.events.recv())
        .await
        .unwrap()
        .unwrap();
    let BridgeEvent::FriendLocationsUpdated(records) = event;
    assert_eq!(records.len(), 2);
    assert_eq!(harness.cache.len(), 2);

    // same payload again: nothing accepted, nothing broadcast
    helper
        .send(json!({
            "event": "new-findmy-location",
            "data": [{"handle": "a@x.com", "coordinates": [1.0, 2.0], "last_updated": 100, "status": "live"}]
        }))
        .await;
    helper.send(json!({"event": "ping", "message": "alive", "process": "FindMy"})).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.events.try_recv().is_err());
}

#[tokio::test]
async fn test_latest_connection_wins() {
    let harness = start(Duration::from_secs(5)).await;
    let _first = FakeHelper::connect(&harness).await;
    let mut second = FakeHelper::connect(&harness).await;
    // let the second connection claim the active slot
    tokio::time::sleep(Duration::from_millis(50)).await;

    let service = Arc::clone(&harness.service);
    let call = tokio::spawn(async move { service.send_request("get-suggested-names", json!({})).await });

    let request = second.next_request().await;
    assert_eq!(request["action"], "get-suggested-names");
    second
        .send(json!({"transactionId": request["transactionId"], "data": []}))
        .await;

    assert_eq!(call.await.unwrap().unwrap().data, json!([]));
}
