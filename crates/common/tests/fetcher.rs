//! Integration tests for HttpFetcher against a local gateway

mod support;

use std::time::Duration;

use futures::StreamExt;

use common::migrations::{read_all, CancelHandle, CancelToken, FetchError, Fetcher, HttpFetcher};
use support::{BIG_LEN, DIST};

#[tokio::test]
async fn test_fetch_success() {
    let origin = support::spawn_gateway().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, 0);

    let stream = fetcher.fetch(&CancelToken::never(), "ok.txt").await.unwrap();
    let body = read_all(stream).await.unwrap();
    assert_eq!(&body[..], b"hello world");
}

#[tokio::test]
async fn test_fetch_error_status_includes_body() {
    let origin = support::spawn_gateway().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, 0);

    let err = match fetcher.fetch(&CancelToken::never(), "missing").await {
        Ok(_) => panic!("expected a 404"),
        Err(e) => e,
    };
    assert!(matches!(err, FetchError::Status { .. }));

    let message = err.to_string();
    assert!(message.contains("Not Found"), "{}", message);
    assert!(message.contains("not found"), "{}", message);
    assert!(message.contains(&format!("{}/dist/missing", origin)), "{}", message);
}

#[tokio::test]
async fn test_fetch_applies_limit() {
    let origin = support::spawn_gateway().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, 100);

    let stream = fetcher.fetch(&CancelToken::never(), "big").await.unwrap();
    let body = read_all(stream).await.unwrap();
    assert_eq!(body.len(), 100);
}

#[tokio::test]
async fn test_fetch_unlimited() {
    let origin = support::spawn_gateway().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, -1);
    assert_eq!(fetcher.limit(), None);

    let stream = fetcher.fetch(&CancelToken::never(), "big").await.unwrap();
    let body = read_all(stream).await.unwrap();
    assert_eq!(body.len(), BIG_LEN);
}

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let origin = support::spawn_gateway().await;

    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), Some("ipfs/test"), 0);
    let body = read_all(fetcher.fetch(&CancelToken::never(), "ua").await.unwrap())
        .await
        .unwrap();
    assert_eq!(&body[..], b"ipfs/test");
}

#[tokio::test]
async fn test_cancel_mid_body() {
    let origin = support::spawn_gateway().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, 0);
    let (handle, token) = CancelHandle::new();

    let mut stream = fetcher.fetch(&token, "stall").await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(&first[..], b"partial");

    handle.cancel();
    let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("cancellation should end the read promptly");
    assert!(matches!(next, Some(Err(FetchError::Cancelled))));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_cancel_before_response() {
    let origin = support::spawn_gateway().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, 0);
    let token = CancelToken::with_deadline(Duration::from_millis(50));

    let result = tokio::time::timeout(Duration::from_secs(5), fetcher.fetch(&token, "hang"))
        .await
        .expect("deadline should abort the request");
    assert!(matches!(result, Err(FetchError::Cancelled)));
}

#[tokio::test]
async fn test_transport_failure() {
    let origin = support::closed_origin().await;
    let fetcher = HttpFetcher::new(Some(DIST), Some(&origin), None, 0);

    let result = fetcher.fetch(&CancelToken::never(), "ok.txt").await;
    assert!(matches!(result, Err(FetchError::Transport(_))));
}
