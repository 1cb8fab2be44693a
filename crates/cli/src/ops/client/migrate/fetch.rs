use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use common::migrations::FetchStream;
use common::prelude::{FetchError, Fetcher};

use super::Source;
use crate::response::{self, ByteStream, Encoding, ErrorCode, Marshal, MarshalError};

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Fetch {
    /// File to fetch, relative to the distribution path (e.g. kubo/versions)
    pub path: String,

    /// Write the payload to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub source: Source,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchOpError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub enum FetchOutput {
    Saved { path: PathBuf, bytes: u64 },
    Body(FetchStream),
}

#[derive(Serialize)]
struct Saved<'a> {
    path: &'a PathBuf,
    bytes: u64,
}

impl fmt::Display for Saved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wrote {} bytes to {}", self.bytes, self.path.display())
    }
}

impl Marshal for FetchOutput {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match *self {
            FetchOutput::Saved { path, bytes } => {
                let saved = Saved { path: &path, bytes };
                match encoding {
                    Encoding::Text => Ok(response::text(&saved)),
                    Encoding::Json => response::json(&saved),
                }
            }
            // payloads are passed through untouched whatever the encoding
            FetchOutput::Body(stream) => Ok(stream
                .map(|chunk| chunk.map_err(io::Error::other))
                .boxed()),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Fetch {
    type Error = FetchOpError;
    type Output = FetchOutput;

    fn error_code(error: &Self::Error) -> ErrorCode {
        match error {
            FetchOpError::Fetch(FetchError::InvalidUrl { .. }) => ErrorCode::Client,
            _ => ErrorCode::Normal,
        }
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        let fetcher = self.source.fetcher(&ctx.config);
        let cancel = self.source.cancel_token();
        let stream = fetcher.fetch(&cancel, &self.path).await?;

        let Some(output) = &self.output else {
            return Ok(FetchOutput::Body(stream));
        };

        match save(stream, output).await {
            Ok(bytes) => {
                tracing::info!(path = %output.display(), bytes, "saved fetched payload");
                Ok(FetchOutput::Saved {
                    path: output.clone(),
                    bytes,
                })
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(output).await {
                    tracing::debug!("failed to remove partial download: {}", rm);
                }
                Err(e)
            }
        }
    }
}

async fn save(mut stream: FetchStream, output: &Path) -> Result<u64, FetchOpError> {
    let write_err = |source| FetchOpError::Write {
        path: output.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(output).await.map_err(write_err)?;
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;
    Ok(written)
}
