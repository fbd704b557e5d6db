//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Multipart, Request};
use axum::http::{HeaderMap, Method};
use axum::middleware::{self, Next};
use axum::Router;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use backend_relay::{RelayConfig, RelayServer, Shutdown};

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Counts and captures every request reaching a mock backend.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: AtomicU32,
    requests: Mutex<Vec<Recorded>>,
}

impl Recorder {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("backend saw no requests")
    }

    fn push(&self, recorded: Recorded) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(recorded);
    }
}

/// Serve `router` on an ephemeral port, recording every request.
pub async fn start_backend(router: Router) -> (SocketAddr, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let rec = recorder.clone();

    let app = router.layer(middleware::from_fn(move |request: Request, next: Next| {
        let rec = rec.clone();
        async move {
            let (parts, body) = request.into_parts();
            let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
            rec.push(Recorded {
                method: parts.method.clone(),
                path_and_query: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_default(),
                headers: parts.headers.clone(),
                body: bytes.clone(),
            });
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
    }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, recorder)
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay configuration pointing at a local backend.
pub fn relay_config(backend: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.containerized = false;
    config.backend.local_host = backend.ip().to_string();
    config.backend.port = backend.port();
    config.timeouts.request_secs = 10;
    config
}

/// Run a relay until the returned [`Shutdown`] fires.
pub async fn spawn_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = RelayServer::new(config).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Test client: no proxy, no redirect following of its own.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Send `GET {target}` byte-for-byte, bypassing client-side URL
/// normalization, and return the response status.
pub async fn raw_get(addr: SocketAddr, target: &str) -> u16 {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status line")
}

/// Backend handler echoing a multipart body as JSON:
/// `{"fields": {name: value}, "file": {"field", "filename", "content_type", "content"}}`.
pub async fn echo_multipart(mut multipart: Multipart) -> axum::Json<Value> {
    let mut fields = Map::new();
    let mut file = Value::Null;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_owned) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.unwrap();
                file = json!({
                    "field": name,
                    "filename": filename,
                    "content_type": content_type,
                    "content": String::from_utf8_lossy(&bytes),
                });
            }
            None => {
                fields.insert(name, Value::String(field.text().await.unwrap()));
            }
        }
    }
    axum::Json(json!({ "fields": fields, "file": file }))
}
