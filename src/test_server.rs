// src/test_server.rs
// A small in-process web server for the tests, so nothing depends on the
// internet. Every request is counted, which lets tests prove that no traffic
// was sent.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = routes().layer(middleware::from_fn_with_state(hits.clone(), count_requests));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    /// host:port to hand to Target::parse
    pub fn connect_host(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// An address nothing is listening on
pub async fn refused_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn routes() -> Router {
    Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/new", get(|| async { "new" }))
        .route("/old", get(|| async { Redirect::temporary("/new") }))
        .route("/chain", get(|| async { Redirect::temporary("/old") }))
        .route("/broken-redirect", get(|| async { Redirect::temporary("/missing") }))
        .route("/loop", get(|| async { Redirect::temporary("/loop") }))
        .route("/headers", get(headers))
        .route("/vhost", get(vhost))
        .route("/slow", get(slow))
}

async fn count_requests(State(hits): State<Arc<AtomicUsize>>, request: Request, next: Next) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn headers() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));
    headers.append(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    headers.append(header::VARY, HeaderValue::from_static("Cookie"));
    (headers, "headers")
}

// 200 only when the Host header names www.example.com
async fn vhost(headers: HeaderMap) -> StatusCode {
    match headers.get(header::HOST) {
        Some(host) if host.as_bytes() == b"www.example.com" => StatusCode::OK,
        _ => StatusCode::MISDIRECTED_REQUEST,
    }
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(50)).await;
    "slow"
}
