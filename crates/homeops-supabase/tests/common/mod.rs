#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
}

/// Canned-response HTTP server on `127.0.0.1:0`.
///
/// Routes match on method and path; the query string is ignored. Unmatched
/// requests get a 404 and are still captured.
pub struct StubServer {
    base_url: String,
    requests: Captured,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

pub struct StubBuilder {
    routes: BTreeMap<&'static str, Vec<(MethodFilter, Canned)>>,
}

fn method_filter(method: &str) -> MethodFilter {
    match method {
        "GET" => MethodFilter::GET,
        "POST" => MethodFilter::POST,
        "PUT" => MethodFilter::PUT,
        "PATCH" => MethodFilter::PATCH,
        "DELETE" => MethodFilter::DELETE,
        other => panic!("unsupported stub method {other}"),
    }
}

fn capture(captured: &Captured, method: &Method, uri: &Uri, headers: &HeaderMap, body: String) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    captured.lock().push(CapturedRequest {
        method: method.to_string(),
        target,
        headers,
        body,
    });
}

async fn unmatched(
    State(captured): State<Captured>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    capture(&captured, &method, &uri, &headers, body);
    (StatusCode::NOT_FOUND, r#"{"message":"no stub route"}"#)
}

fn with_canned(
    method_router: MethodRouter<Captured>,
    filter: MethodFilter,
    canned: Canned,
) -> MethodRouter<Captured> {
    method_router.on(
        filter,
        move |State(captured): State<Captured>,
              method: Method,
              uri: Uri,
              headers: HeaderMap,
              body: String| async move {
            capture(&captured, &method, &uri, &headers, body);
            (
                canned.status,
                [(header::CONTENT_TYPE, "application/json")],
                canned.body,
            )
        },
    )
}

impl StubBuilder {
    pub fn route(
        mut self,
        method: &'static str,
        path: &'static str,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        let canned = Canned {
            status: StatusCode::from_u16(status).expect("invalid stub status"),
            body: body.into(),
        };
        self.routes
            .entry(path)
            .or_default()
            .push((method_filter(method), canned));
        self
    }

    pub async fn start(self) -> StubServer {
        let requests: Captured = Arc::new(Mutex::new(Vec::new()));

        let mut app = Router::new();
        for (path, canned_routes) in self.routes {
            let mut method_router = MethodRouter::new().fallback(unmatched);
            for (filter, canned) in canned_routes {
                method_router = with_canned(method_router, filter, canned);
            }
            app = app.route(path, method_router);
        }
        let app = app.fallback(unmatched).with_state(requests.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr: SocketAddr = listener.local_addr().expect("stub listener addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        StubServer {
            base_url: format!("http://{addr}"),
            requests,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

impl StubServer {
    pub fn builder() -> StubBuilder {
        StubBuilder {
            routes: BTreeMap::new(),
        }
    }

    /// Returns the server base URL (e.g., `http://127.0.0.1:12345`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("stub received no requests")
    }

    /// Stop accepting connections and wait for the server task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub const LOGIN_OK: &str = r#"{
    "access_token": "jwt-owner",
    "token_type": "bearer",
    "expires_in": 3600,
    "refresh_token": "refresh-owner",
    "user": { "id": "user-owner", "email": "owner@example.com" }
}"#;

pub const ENTRIES_OK: &str = r#"[
    {"id":"3","created_at":"2025-01-03T09:00:00+00:00","type":"todo","title":"Seal rim joists","value":null,"notes":"Add to weekend list"},
    {"id":"2","created_at":"2025-01-02T09:00:00+00:00","type":"fix","title":"Door seal","value":45,"notes":null},
    {"id":"1","created_at":"2025-01-01T09:00:00+00:00","type":"improvement","title":"Garage insulation","value":42,"notes":"Added rigid foam"}
]"#;
