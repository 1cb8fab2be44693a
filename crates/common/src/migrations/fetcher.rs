use futures::stream::BoxStream;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use url::Url;

use super::cancel::{CancelToken, Cancellable};
use super::limit::LimitReadCloser;
use super::FetchError;

pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.io";
pub const DEFAULT_FETCH_LIMIT: u64 = 1024 * 1024 * 512;
/// IPNS path of the official distribution site
pub const IPNS_IPFS_DIST: &str = "/ipns/dist.ipfs.tech";

/// A fetched payload. Dropping it releases the connection.
pub type FetchStream = BoxStream<'static, Result<bytes::Bytes, FetchError>>;

/// Retrieves files from a distribution site.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the file at `file_path`, relative to the fetcher's distribution path.
    async fn fetch(&self, cancel: &CancelToken, file_path: &str)
        -> Result<FetchStream, FetchError>;
}

/// Fetches files over HTTP from an IPFS gateway. Makes a single attempt per call.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    dist_path: String,
    gateway: String,
    limit: Option<u64>,
    user_agent: Option<String>,
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None, None, None, 0)
    }
}

impl HttpFetcher {
    /// Create a new fetcher.
    ///
    /// `None` or an empty string selects the default dist path and gateway.
    /// A `fetch_limit` of 0 selects the default ceiling; negative values disable it.
    pub fn new(
        dist_path: Option<&str>,
        gateway: Option<&str>,
        user_agent: Option<&str>,
        fetch_limit: i64,
    ) -> Self {
        let dist_path = match dist_path.filter(|p| !p.is_empty()) {
            Some(p) if p.starts_with('/') => p.to_string(),
            Some(p) => format!("/{}", p),
            None => IPNS_IPFS_DIST.to_string(),
        };

        let gateway = gateway
            .filter(|g| !g.is_empty())
            .map(|g| g.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

        Self {
            dist_path,
            gateway,
            limit: resolve_limit(fetch_limit),
            user_agent: user_agent.filter(|ua| !ua.is_empty()).map(str::to_string),
            client: Client::new(),
        }
    }

    pub fn dist_path(&self) -> &str {
        &self.dist_path
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    /// Byte ceiling applied to fetched bodies, `None` when unlimited.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Full gateway URL for a file under the distribution path.
    pub fn url_for(&self, file_path: &str) -> String {
        format!("{}{}", self.gateway, join_path(&self.dist_path, file_path))
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        cancel: &CancelToken,
        file_path: &str,
    ) -> Result<FetchStream, FetchError> {
        let url = self.url_for(file_path);
        let parsed = Url::parse(&url).map_err(|source| FetchError::InvalidUrl {
            url: url.clone(),
            source,
        })?;

        let mut request = self.client.get(parsed);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }

        tracing::debug!(url = %url, limit = ?self.limit, "fetching from distribution site");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            // the response is consumed here either way, releasing the body
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                body = response.bytes() => body.map_err(FetchError::ErrorBody)?,
            };
            return Err(FetchError::Status {
                url,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let body = Cancellable::new(Box::pin(response.bytes_stream()), cancel);
        match self.limit {
            Some(limit) => Ok(Box::pin(LimitReadCloser::new(body, limit))),
            None => Ok(Box::pin(body)),
        }
    }
}

fn resolve_limit(fetch_limit: i64) -> Option<u64> {
    match fetch_limit {
        0 => Some(DEFAULT_FETCH_LIMIT),
        n if n < 0 => None,
        n => Some(n as u64),
    }
}

/// Join and clean path segments: duplicate separators collapse, `.` is
/// dropped, `..` pops, and the result is rooted with no trailing separator.
pub(crate) fn join_path(base: &str, file: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(file.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let fetcher = HttpFetcher::default();
        assert_eq!(fetcher.dist_path(), IPNS_IPFS_DIST);
        assert_eq!(fetcher.gateway(), DEFAULT_GATEWAY_URL);
        assert_eq!(fetcher.limit(), Some(DEFAULT_FETCH_LIMIT));
    }

    #[test]
    fn test_limit_selection() {
        assert_eq!(HttpFetcher::new(None, None, None, 0).limit(), Some(DEFAULT_FETCH_LIMIT));
        assert_eq!(HttpFetcher::new(None, None, None, -1).limit(), None);
        assert_eq!(HttpFetcher::new(None, None, None, 4096).limit(), Some(4096));
    }

    #[test]
    fn test_dist_path_gets_leading_slash() {
        let fetcher = HttpFetcher::new(Some("ipns/example"), None, None, 0);
        assert_eq!(fetcher.dist_path(), "/ipns/example");
    }

    #[test]
    fn test_empty_strings_select_defaults() {
        let fetcher = HttpFetcher::new(Some(""), Some(""), Some(""), 0);
        assert_eq!(fetcher.dist_path(), IPNS_IPFS_DIST);
        assert_eq!(fetcher.gateway(), DEFAULT_GATEWAY_URL);
        assert!(fetcher.user_agent.is_none());
    }

    #[test]
    fn test_url_join_slash_combinations() {
        let gateways = ["http://127.0.0.1:8080", "http://127.0.0.1:8080/"];
        let bases = ["/a", "a", "/a/", "a/", "//a//"];
        let files = ["b", "/b", "b/", "//b"];

        for gateway in gateways {
            for base in bases {
                for file in files {
                    let fetcher = HttpFetcher::new(Some(base), Some(gateway), None, 0);
                    assert_eq!(
                        fetcher.url_for(file),
                        "http://127.0.0.1:8080/a/b",
                        "gateway={gateway:?} base={base:?} file={file:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_join_path_cleans_dots() {
        assert_eq!(join_path("/a/./b", "../c"), "/a/c");
        assert_eq!(join_path("/", ".."), "/");
        assert_eq!(join_path("/dist", "kubo/v0.1.0/kubo.tar.gz"), "/dist/kubo/v0.1.0/kubo.tar.gz");
    }
}
