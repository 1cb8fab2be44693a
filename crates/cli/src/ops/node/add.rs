use std::fmt;
use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::node::NodeError;
use crate::response::{self, ByteStream, Encoding, ErrorCode, Marshal, MarshalError};

/// Add a file to the block store
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Add {
    /// File to add
    pub file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error("cannot read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Node(#[from] NodeError),
}

#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub hash: String,
    pub name: String,
    pub size: u64,
}

impl fmt::Display for AddOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "added {} {}", self.hash, self.name)
    }
}

impl Marshal for AddOutput {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match encoding {
            Encoding::Text => Ok(response::text(&self)),
            Encoding::Json => response::json(&self),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Add {
    type Error = AddError;
    type Output = AddOutput;

    fn error_code(error: &Self::Error) -> ErrorCode {
        match error {
            AddError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorCode::Client
            }
            _ => ErrorCode::Normal,
        }
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        let node = ctx.node()?;

        let data = tokio::fs::read(&self.file)
            .await
            .map_err(|source| AddError::Read {
                path: self.file.clone(),
                source,
            })?;
        let size = data.len() as u64;
        let hash = node.put_block(Bytes::from(data)).await?;

        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string());

        Ok(AddOutput { hash, name, size })
    }
}
