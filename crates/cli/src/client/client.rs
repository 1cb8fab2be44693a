use std::io;

use futures::StreamExt;
use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::DialArgs;

use super::error::ApiError;
use crate::ops::CoreCommand;
use crate::response::{CommandError, Encoding, ErrorCode, Response};

/// Path prefix of the daemon's command API.
pub const API_PREFIX: &str = "api/v0";

/// Body of a command forwarded to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub encoding: Encoding,
    pub command: CoreCommand,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Client for the daemon listening at `dial`.
    pub fn from_dial_args(dial: &DialArgs) -> Result<Self, ApiError> {
        let remote = Url::parse(&format!("http://{}/", dial.host))?;
        Self::new(&remote)
    }

    /// URL a command path is served at.
    pub fn url_for(&self, path: &[String]) -> Result<Url, ApiError> {
        Ok(self
            .remote
            .join(&format!("{}/{}", API_PREFIX, path.join("/")))?)
    }

    /// Forward a command to the daemon.
    ///
    /// A 2xx response streams its body back as the command output. Any other
    /// status carries a [`CommandError`] as JSON; bodies that are not are
    /// reported as ordinary errors with the status attached.
    pub async fn send(
        &self,
        path: &[String],
        encoding: Encoding,
        command: &CoreCommand,
    ) -> Result<Response, ApiError> {
        let url = self.url_for(path)?;
        let body = ApiRequest {
            encoding,
            command: command.clone(),
        };

        tracing::debug!(%url, %encoding, "forwarding command to daemon");
        let response = self.client.post(url).json(&body).send().await?;

        let status = response.status();
        if status.is_success() {
            let stream = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(io::Error::other))
                .boxed();
            return Ok(Response::stream(path.to_vec(), stream));
        }

        let text = response.text().await?;
        let error = match serde_json::from_str::<CommandError>(&text) {
            Ok(error) => error,
            Err(_) => CommandError::new(
                ApiError::HttpStatus(status, text.trim().to_string()).to_string(),
                ErrorCode::Normal,
            ),
        };
        Ok(Response::failure(path.to_vec(), error))
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }
}
