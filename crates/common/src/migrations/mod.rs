//! Fetching of repo migration payloads from a distribution gateway.
//!
//! Every fetch is a single attempt: no retries, the first failure is
//! returned to the caller. Bodies are capped at a configurable byte ceiling
//! and can be cancelled mid-read through a [`CancelToken`].

mod cancel;
mod fetcher;
mod limit;
mod versions;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

pub use cancel::{CancelHandle, CancelToken, Cancellable};
pub use fetcher::{
    FetchStream, Fetcher, HttpFetcher, DEFAULT_FETCH_LIMIT, DEFAULT_GATEWAY_URL, IPNS_IPFS_DIST,
};
pub use limit::LimitReadCloser;
pub use versions::{dist_versions, latest_dist_version, DistVersion};

/// Environment variable overriding the configured distribution path.
pub const DIST_PATH_ENV: &str = "IPFS_DIST_PATH";

/// Distribution path from the environment, if set and non-empty.
pub fn dist_path_from_env() -> Option<String> {
    std::env::var(DIST_PATH_ENV).ok().filter(|p| !p.is_empty())
}

/// Drain a fetched stream into memory. The stream's own ceiling still applies.
pub async fn read_all<S>(mut stream: S) -> Result<Bytes, FetchError>
where
    S: Stream<Item = Result<Bytes, FetchError>> + Unpin,
{
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid request url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("http request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("fetch cancelled")]
    Cancelled,
    #[error("error reading error body: {0}")]
    ErrorBody(reqwest::Error),
    #[error("GET {url} error: {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no versions found in {0}")]
    NoVersions(String),
}
