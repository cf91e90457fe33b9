#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use bbdown_manager::BackendClient;

/// 测试用的 BBDown 服务端
#[derive(Default)]
pub struct MockState {
    pub listing: Mutex<Value>,
    pub raw_body: Mutex<Option<String>>,
    pub status: Mutex<Option<StatusCode>>,
    pub delay: Mutex<Duration>,
    pub add_bodies: Mutex<Vec<Value>>,
    pub removed: Mutex<Vec<String>>,
    pub list_hits: AtomicUsize,
    pub shutdown_hits: AtomicUsize,
}

impl MockState {
    fn status(&self) -> StatusCode {
        self.status.lock().unwrap().unwrap_or(StatusCode::OK)
    }

    async fn wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            listing: Mutex::new(json!({ "Running": [], "Finished": [] })),
            ..Default::default()
        });

        let app = Router::new()
            .route("/get-tasks/", get(list_all))
            .route("/get-tasks/running", get(list_running))
            .route("/get-tasks/finished", get(list_finished))
            .route("/get-tasks/{aid}", get(get_one))
            .route("/add-task", post(add_task))
            .route("/remove-finished", get(remove_finished))
            .route("/remove-finished/failed", get(remove_failed))
            .route("/remove-finished/{aid}", get(remove_one))
            .route("/shutdown", post(shutdown))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new("127.0.0.1", self.addr.port()).unwrap()
    }

    pub fn set_listing(&self, listing: Value) {
        *self.state.listing.lock().unwrap() = listing;
    }

    pub fn set_raw_body(&self, body: &str) {
        *self.state.raw_body.lock().unwrap() = Some(body.to_string());
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.state.status.lock().unwrap() = Some(status);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn list_hits(&self) -> usize {
        self.state.list_hits.load(Ordering::SeqCst)
    }

    pub fn add_bodies(&self) -> Vec<Value> {
        self.state.add_bodies.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.state.removed.lock().unwrap().clone()
    }
}

/// 取一个当前没有监听的端口
pub async fn unused_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn task_json(aid: &str, finished: bool) -> Value {
    json!({
        "Aid": aid,
        "Title": format!("title-{}", aid),
        "Url": format!("BV{}", aid),
        "TaskCreateTime": 1_700_000_000,
        "TaskFinishTime": if finished { json!(1_700_000_600) } else { Value::Null },
        "Progress": if finished { 1.0 } else { 0.5 },
        "DownloadSpeed": 1024,
        "TotalDownloadedBytes": 4096,
        "IsSuccessful": finished,
    })
}

async fn list_all(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    state.wait().await;
    let body = match state.raw_body.lock().unwrap().clone() {
        Some(raw) => raw,
        None => state.listing.lock().unwrap().to_string(),
    };
    (state.status(), body)
}

fn partition(state: &MockState, key: &str) -> Value {
    state.listing.lock().unwrap()[key].clone()
}

async fn list_running(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.wait().await;
    (state.status(), Json(partition(&state, "Running")))
}

async fn list_finished(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.wait().await;
    (state.status(), Json(partition(&state, "Finished")))
}

async fn get_one(
    State(state): State<Arc<MockState>>,
    Path(aid): Path<String>,
) -> (StatusCode, Json<Value>) {
    state.wait().await;
    let listing = state.listing.lock().unwrap().clone();
    let found = ["Running", "Finished"]
        .iter()
        .filter_map(|key| listing[*key].as_array())
        .flatten()
        .find(|task| task["Aid"] == aid)
        .cloned();
    match found {
        Some(task) => (state.status(), Json(task)),
        None => (StatusCode::NOT_FOUND, Json(Value::Null)),
    }
}

async fn add_task(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> StatusCode {
    state.add_bodies.lock().unwrap().push(body);
    state.wait().await;
    state.status()
}

async fn remove_finished(State(state): State<Arc<MockState>>) -> StatusCode {
    state.removed.lock().unwrap().push("<finished>".to_string());
    state.status()
}

async fn remove_failed(State(state): State<Arc<MockState>>) -> StatusCode {
    state.removed.lock().unwrap().push("<failed>".to_string());
    state.status()
}

async fn remove_one(State(state): State<Arc<MockState>>, Path(aid): Path<String>) -> StatusCode {
    state.removed.lock().unwrap().push(aid);
    state.status()
}

async fn shutdown(State(state): State<Arc<MockState>>) -> StatusCode {
    state.shutdown_hits.fetch_add(1, Ordering::SeqCst);
    state.status()
}
