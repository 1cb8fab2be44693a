//! Shared test utilities for fetcher integration tests
#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header::USER_AGENT, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;

pub const DIST: &str = "/dist";
pub const BIG_LEN: usize = 4096;

/// Spawn a fake distribution gateway on an ephemeral port and return its origin.
pub async fn spawn_gateway() -> String {
    let router = Router::new()
        .route("/dist/ok.txt", get(|| async { "hello world" }))
        .route(
            "/dist/missing",
            get(|| async { (StatusCode::NOT_FOUND, "not found") }),
        )
        .route("/dist/big", get(|| async { vec![b'x'; BIG_LEN] }))
        .route(
            "/dist/ua",
            get(|headers: HeaderMap| async move {
                headers
                    .get(USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string()
            }),
        )
        .route(
            "/dist/stall",
            get(|| async {
                let first = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
                    b"partial",
                ))]);
                Body::from_stream(first.chain(futures::stream::pending()))
            }),
        )
        .route(
            "/dist/hang",
            get(|| async {
                std::future::pending::<()>().await;
                "unreachable"
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An origin nothing is listening on.
pub async fn closed_origin() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
