use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use url::Url;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<(Method, String), VecDeque<(StatusCode, Value)>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local HTTP server standing in for the platform API under `/api/`.
///
/// Responses are queued per method and path and served in order. The last
/// queued response for a route is repeated once the queue drains. Unknown
/// routes answer 404 with an empty errors document.
pub struct MockPlatformServer {
    addr: std::net::SocketAddr,
    state: Arc<MockState>,
}

impl MockPlatformServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        MockPlatformServer { addr, state }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/", self.addr)).unwrap()
    }

    pub fn respond(&self, method: reqwest::Method, path: &str, status: StatusCode, body: Value) {
        self.state
            .responses
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back((status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    state.requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        headers,
        body,
    });

    let mut responses = state.responses.lock();
    let reply = match responses.get_mut(&(method, uri.path().to_string())) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
    };
    match reply {
        Some((status, body)) => (status, axum::Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({"errors": []})),
        )
            .into_response(),
    }
}
