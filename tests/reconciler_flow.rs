//! Reconciliation loop integration tests: wholesale snapshot replacement,
//! foreground/background error policy, busy-flag survival, and deterministic
//! teardown of the polling loop.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use po_pilot::backend::{BackendApi, HttpBackend, PoStatus};
use po_pilot::workflow::{BusyTable, NotificationSink, Reconciler, RecordingSink, Severity};

fn po_json(id: u64, is_ats: bool, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("PO {id}"),
        "is_ats": is_ats,
        "status": status,
    })
}

fn reconciler_for(server: &MockServer, poll_interval: Duration) -> (Arc<Reconciler>, Arc<RecordingSink>) {
    let backend: Arc<dyn BackendApi> = Arc::new(
        HttpBackend::new(&server.uri(), Duration::from_secs(5)).expect("client builds"),
    );
    let sink = Arc::new(RecordingSink::new());
    let reconciler = Arc::new(Reconciler::new(
        backend,
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
        BusyTable::new(),
        poll_interval,
    ));
    (reconciler, sink)
}

async fn count_gets(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.method == wiremock::http::Method::GET)
        .count()
}

#[tokio::test]
async fn snapshot_is_replaced_wholesale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            po_json(1, false, "Worksheet Created"),
            po_json(2, true, "PO Created"),
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([po_json(2, true, "PO Received")])),
        )
        .mount(&server)
        .await;

    let (reconciler, _sink) = reconciler_for(&server, Duration::from_secs(15));
    reconciler.refresh(false).await;
    assert_eq!(reconciler.snapshot().len(), 2);

    reconciler.refresh(false).await;
    let snapshot = reconciler.snapshot();
    // No merge, no leftovers: the collection is exactly what the backend sent.
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, 2);
    assert_eq!(snapshot[0].status, PoStatus::PoReceived);
    assert!(reconciler.get(1).is_none());
}

#[tokio::test]
async fn busy_flag_survives_snapshot_replacement() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([po_json(1, false, "Worksheet Created")])),
        )
        .mount(&server)
        .await;

    let (reconciler, _sink) = reconciler_for(&server, Duration::from_secs(15));
    reconciler.refresh(false).await;

    let held = reconciler.busy_table().try_begin(1).expect("row free");
    // A poll overwrites the collection while the transition is in flight; the
    // busy marker lives in the side table and must survive.
    reconciler.refresh(true).await;

    let rows = reconciler.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].busy);
    assert!(rows[0].actions.is_empty());

    drop(held);
    let rows = reconciler.rows();
    assert!(!rows[0].busy);
    let operations: Vec<_> = rows[0].actions.iter().map(|spec| spec.operation).collect();
    assert_eq!(operations, vec!["create-breakdown", "delete"]);
}

#[tokio::test]
async fn foreground_fetch_surfaces_errors_and_clears_loading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"detail": "Could not retrieve Purchase Orders."})),
        )
        .mount(&server)
        .await;

    let (reconciler, sink) = reconciler_for(&server, Duration::from_secs(15));
    reconciler.refresh(false).await;

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Could not retrieve Purchase Orders.");
    assert_eq!(notices[0].severity, Severity::Error);
    assert!(!reconciler.is_loading());
}

#[tokio::test]
async fn background_fetch_swallows_errors_and_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"detail": "boom"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([po_json(1, false, "Worksheet Created")])),
        )
        .mount(&server)
        .await;

    let (reconciler, sink) = reconciler_for(&server, Duration::from_secs(15));
    reconciler.refresh(true).await;
    // Interval noise never reaches the user.
    assert!(sink.is_empty());
    assert!(reconciler.snapshot().is_empty());

    reconciler.refresh(true).await;
    assert_eq!(reconciler.snapshot().len(), 1);
}

#[tokio::test]
async fn loading_flag_tracks_foreground_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let (reconciler, _sink) = reconciler_for(&server, Duration::from_secs(15));
    let background = Arc::clone(&reconciler);
    let fetch = tokio::spawn(async move { background.refresh(false).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(reconciler.is_loading());

    fetch.await.expect("fetch task completes");
    assert!(!reconciler.is_loading());
}

#[tokio::test]
async fn background_mode_never_raises_the_loading_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let (reconciler, _sink) = reconciler_for(&server, Duration::from_secs(15));
    let background = Arc::clone(&reconciler);
    let fetch = tokio::spawn(async move { background.refresh(true).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!reconciler.is_loading());
    fetch.await.expect("fetch task completes");
}

#[tokio::test]
async fn subscribers_observe_each_replacement() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([po_json(1, false, "Worksheet Created")])),
        )
        .mount(&server)
        .await;

    let (reconciler, _sink) = reconciler_for(&server, Duration::from_secs(15));
    let mut snapshots = reconciler.subscribe();

    reconciler.refresh(false).await;
    snapshots.changed().await.expect("sender alive");
    assert_eq!(snapshots.borrow_and_update().len(), 1);
}

#[tokio::test]
async fn poll_loop_fetches_on_interval_and_stops_deterministically() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let (reconciler, _sink) = reconciler_for(&server, Duration::from_millis(100));
    let poll_loop = reconciler.spawn_poll_loop();

    tokio::time::sleep(Duration::from_millis(350)).await;
    let while_running = count_gets(&server).await;
    // One view-enter fetch plus interval ticks.
    assert!(while_running >= 2, "expected repeated fetches, saw {while_running}");

    poll_loop.stop().await;
    let after_stop = count_gets(&server).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    // Teardown is deterministic: no dangling interval keeps fetching.
    assert_eq!(count_gets(&server).await, after_stop);
}

#[tokio::test]
async fn poll_loop_continues_after_a_failed_tick() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"detail": "boom"})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([po_json(9, true, "Worksheet Created")])),
        )
        .mount(&server)
        .await;

    let (reconciler, sink) = reconciler_for(&server, Duration::from_millis(100));
    let poll_loop = reconciler.spawn_poll_loop();

    tokio::time::sleep(Duration::from_millis(400)).await;
    poll_loop.stop().await;

    // The loop rode out the failures and the snapshot caught up.
    assert_eq!(reconciler.snapshot().len(), 1);
    // The view-enter fetch was foreground and surfaced its error; the failed
    // background tick stayed silent.
    assert_eq!(sink.notices().len(), 1);
}
