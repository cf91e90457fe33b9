mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::{Value, json};

use bbdown_manager::common::api::error::ApiError;
use bbdown_manager::{
    AddOutcome, AddTaskOptions, BackendClient, Listing, Lookup, OptionKey, RemoveOutcome,
    ShutdownOutcome,
};
use common::{MockBackend, task_json, unused_port};

#[tokio::test]
async fn test_list_all_splits_by_finish_time() {
    let backend = MockBackend::start().await;
    // 服务端把已结束的任务错放在 Running 里，也应按完成时间归类
    backend.set_listing(json!({
        "Running": [task_json("1", false), task_json("2", true)],
        "Finished": [task_json("3", true)],
    }));

    let snapshot = match backend.client().list_all().await {
        Listing::Available(snapshot) => snapshot,
        Listing::Unavailable(e) => panic!("期望获取成功: {}", e),
    };

    let running: Vec<&str> = snapshot.running().iter().map(|t| t.aid.as_str()).collect();
    let finished: Vec<&str> = snapshot.finished().iter().map(|t| t.aid.as_str()).collect();
    assert_eq!(running, vec!["1"]);
    assert_eq!(finished, vec!["2", "3"]);

    let task = snapshot.find("1").unwrap();
    assert_eq!(task.title, "title-1");
    assert_eq!(task.progress, 0.5);
    assert_eq!(task.download_speed, 1024);
    assert_eq!(task.created_at, Some(1_700_000_000));
    assert!(task.finished_at.is_none());
}

#[tokio::test]
async fn test_list_all_missing_arrays_are_empty() {
    let backend = MockBackend::start().await;
    backend.set_listing(json!({ "Running": [task_json("1", false)] }));

    let snapshot = backend.client().list_all().await.snapshot().unwrap();
    assert_eq!(snapshot.running().len(), 1);
    assert!(snapshot.finished().is_empty());
}

#[tokio::test]
async fn test_list_all_non_200_is_unavailable() {
    let backend = MockBackend::start().await;
    backend.set_status(StatusCode::INTERNAL_SERVER_ERROR);

    match backend.client().list_all().await {
        Listing::Unavailable(ApiError::Status(status)) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => panic!("期望 Unavailable(Status)，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_list_all_bad_body_is_unavailable() {
    let backend = MockBackend::start().await;
    backend.set_raw_body("<html>not json</html>");

    match backend.client().list_all().await {
        Listing::Unavailable(ApiError::InvalidResponse(_)) => {}
        other => panic!("期望 Unavailable(InvalidResponse)，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_list_all_unreachable_host_returns_within_timeout() {
    let port = unused_port().await;
    let client = BackendClient::new("127.0.0.1", port)
        .unwrap()
        .with_timeouts(Duration::from_millis(500), Duration::from_secs(1));

    let started = Instant::now();
    let listing = client.list_all().await;
    assert!(!listing.is_available());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_list_all_slow_backend_times_out() {
    let backend = MockBackend::start().await;
    backend.set_delay(Duration::from_secs(3));
    let client = backend
        .client()
        .with_timeouts(Duration::from_millis(200), Duration::from_secs(1));

    let started = Instant::now();
    match client.list_all().await {
        Listing::Unavailable(e) => assert!(e.is_transport(), "unexpected error: {}", e),
        Listing::Available(_) => panic!("慢速服务端不应返回结果"),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_list_running_and_finished() {
    let backend = MockBackend::start().await;
    backend.set_listing(json!({
        "Running": [task_json("1", false)],
        "Finished": [task_json("2", true), task_json("3", true)],
    }));
    let client = backend.client();

    assert_eq!(client.list_running().await.len(), 1);
    assert_eq!(client.list_finished().await.len(), 2);

    backend.set_status(StatusCode::BAD_GATEWAY);
    assert!(client.list_running().await.is_empty());
    assert!(client.list_finished().await.is_empty());
}

#[tokio::test]
async fn test_get_one() {
    let backend = MockBackend::start().await;
    backend.set_listing(json!({ "Running": [task_json("42", false)], "Finished": [] }));
    let client = backend.client();

    match client.get_one("42").await {
        Lookup::Found(task) => assert_eq!(task.url, "BV42"),
        Lookup::NotFound(e) => panic!("期望找到任务: {}", e),
    }

    match client.get_one("missing").await {
        Lookup::NotFound(ApiError::Status(status)) => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("期望 NotFound，实际为 {:?}", other),
    }

    assert!(client.get_one("  ").await.task().is_none());
}

#[tokio::test]
async fn test_add_accepted_with_url_merged() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let outcome = client.add("BV1xx", &AddTaskOptions::new()).await;
    assert!(outcome.is_accepted());

    let bodies = backend.add_bodies();
    assert_eq!(bodies, vec![json!({ "Url": "BV1xx" })]);
}

#[tokio::test]
async fn test_add_omits_empty_text_but_keeps_false_flags() {
    let backend = MockBackend::start().await;
    let options = AddTaskOptions::new()
        .with_text(OptionKey::WorkDir, "  /data/videos ")
        .with_text(OptionKey::Cookie, "   ")
        .with_flag(OptionKey::MultiThread, true)
        .with_flag(OptionKey::UseTvApi, false);

    assert!(backend.client().add("BV1xx", &options).await.is_accepted());

    let body = backend.add_bodies().pop().unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object["Url"], "BV1xx");
    assert_eq!(object["WorkDir"], "/data/videos");
    assert_eq!(object["MultiThread"], Value::Bool(true));
    assert_eq!(object["UseTvApi"], Value::Bool(false));
    assert!(!object.contains_key("Cookie"));
    assert_eq!(object.len(), 4);
}

#[tokio::test]
async fn test_add_rejected_on_server_error() {
    let backend = MockBackend::start().await;
    backend.set_status(StatusCode::INTERNAL_SERVER_ERROR);

    match backend.client().add("BV1xx", &AddTaskOptions::new()).await {
        AddOutcome::Rejected(ApiError::Status(status)) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => panic!("期望 Rejected，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_add_rejected_on_timeout() {
    let backend = MockBackend::start().await;
    backend.set_delay(Duration::from_secs(3));
    let client = backend
        .client()
        .with_timeouts(Duration::from_millis(100), Duration::from_millis(300));

    let started = Instant::now();
    let outcome = client.add("BV1xx", &AddTaskOptions::new()).await;
    assert!(!outcome.is_accepted());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_add_rejects_blank_url_without_request() {
    let backend = MockBackend::start().await;
    let outcome = backend.client().add("  ", &AddTaskOptions::new()).await;
    assert!(matches!(outcome, AddOutcome::Rejected(ApiError::InvalidTarget(_))));
    assert!(backend.add_bodies().is_empty());
}

#[tokio::test]
async fn test_remove_operations_hit_expected_paths() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    assert!(client.remove_one("123").await.is_removed());
    assert!(client.remove_all_finished().await.is_removed());
    assert!(client.remove_all_failed().await.is_removed());

    assert_eq!(backend.removed(), vec!["123", "<finished>", "<failed>"]);
}

#[tokio::test]
async fn test_remove_blank_aid_never_clears_everything() {
    let backend = MockBackend::start().await;
    let outcome = backend.client().remove_one("").await;
    assert!(matches!(outcome, RemoveOutcome::Failed(ApiError::InvalidTarget(_))));
    assert!(backend.removed().is_empty());
}

#[tokio::test]
async fn test_remove_failed_on_non_200() {
    let backend = MockBackend::start().await;
    backend.set_status(StatusCode::NOT_FOUND);
    let client = backend.client();

    assert!(!client.remove_one("123").await.is_removed());
    assert!(!client.remove_all_finished().await.is_removed());
    assert!(!client.remove_all_failed().await.is_removed());
}

#[tokio::test]
async fn test_reconnect_swaps_target() {
    let first = MockBackend::start().await;
    let second = MockBackend::start().await;
    first.set_listing(json!({ "Running": [task_json("a", false)], "Finished": [] }));
    second.set_listing(json!({ "Running": [task_json("b", false)], "Finished": [] }));

    let client = first.client();
    let shared = client.clone();
    assert!(client.list_all().await.snapshot().unwrap().find("a").is_some());

    client.reconnect("127.0.0.1", second.addr.port()).unwrap();
    // 克隆出的客户端共享同一个目标
    let snapshot = shared.list_all().await.snapshot().unwrap();
    assert!(snapshot.find("b").is_some());
    assert_eq!(client.base_url().port(), Some(second.addr.port()));
}

#[tokio::test]
async fn test_reconnect_invalid_input_keeps_target() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let before = client.base_url();

    assert!(matches!(client.reconnect("", 8080), Err(ApiError::InvalidTarget(_))));
    assert!(matches!(client.reconnect("localhost", 0), Err(ApiError::InvalidTarget(_))));
    assert_eq!(client.base_url(), before);
    assert!(client.list_all().await.is_available());
}

#[tokio::test]
async fn test_in_flight_call_keeps_previous_target() {
    let slow = MockBackend::start().await;
    let other = MockBackend::start().await;
    slow.set_listing(json!({ "Running": [task_json("old", false)], "Finished": [] }));
    slow.set_delay(Duration::from_millis(300));
    other.set_listing(json!({ "Running": [task_json("new", false)], "Finished": [] }));

    let client = slow.client();
    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.list_all().await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    client.reconnect("127.0.0.1", other.addr.port()).unwrap();

    let snapshot = in_flight.await.unwrap().snapshot().unwrap();
    assert!(snapshot.find("old").is_some());
    assert!(client.list_all().await.snapshot().unwrap().find("new").is_some());
}

#[tokio::test]
async fn test_shutdown_and_probe() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    assert!(client.probe(Duration::from_secs(1)).await);
    assert!(matches!(client.shutdown().await, ShutdownOutcome::Accepted));
    assert_eq!(
        backend
            .state
            .shutdown_hits
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );

    let offline = BackendClient::new("127.0.0.1", unused_port().await).unwrap();
    assert!(!offline.probe(Duration::from_millis(500)).await);
    assert!(!offline.shutdown().await.is_accepted());
}
