use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};

use common::prelude::Config;

/// An in-process node that commands run against when no daemon is serving
/// the config root.
#[async_trait::async_trait]
pub trait Node: Send + Sync {
    fn peer_id(&self) -> &str;

    fn is_online(&self) -> bool;

    /// Store a block, returning its content hash.
    async fn put_block(&self, data: Bytes) -> Result<String, NodeError>;

    async fn get_block(&self, hash: &str) -> Result<Bytes, NodeError>;

    /// Release the node's resources. Closing twice is not an error.
    fn close(&mut self) -> Result<(), NodeError>;
}

/// Constructs nodes for the local execution path.
pub trait NodeFactory: Send + Sync {
    fn build(
        &self,
        config_root: &Path,
        config: &Config,
        online: bool,
    ) -> Result<Box<dyn Node>, NodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("config has no peer identity, run 'ipfs init' first")]
    MissingIdentity,
    #[error("invalid block hash: {0:?}")]
    InvalidHash(String),
    #[error("block not found: {0}")]
    BlockNotFound(String),
    #[error("node is closed")]
    Closed,
    #[error("command requires a node but none is attached")]
    NotAttached,
    #[error("block store error: {0}")]
    Io(#[from] io::Error),
}

/// Builds [`LocalNode`]s backed by the config's datastore directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNodeFactory;

impl NodeFactory for LocalNodeFactory {
    fn build(
        &self,
        config_root: &Path,
        config: &Config,
        online: bool,
    ) -> Result<Box<dyn Node>, NodeError> {
        if config.identity.peer_id.is_empty() {
            return Err(NodeError::MissingIdentity);
        }

        let blocks = config_root.join(&config.datastore.path);
        std::fs::create_dir_all(&blocks)?;

        tracing::debug!(
            peer_id = %config.identity.peer_id,
            blocks = %blocks.display(),
            online,
            "constructed local node"
        );

        Ok(Box::new(LocalNode {
            peer_id: config.identity.peer_id.clone(),
            online,
            blocks,
            closed: false,
        }))
    }
}

/// Content-addressed block store on the local filesystem.
///
/// Blocks live at `<blocks>/<sha256 hex>`.
#[derive(Debug)]
pub struct LocalNode {
    peer_id: String,
    online: bool,
    blocks: PathBuf,
    closed: bool,
}

impl LocalNode {
    fn ensure_open(&self) -> Result<(), NodeError> {
        if self.closed {
            return Err(NodeError::Closed);
        }
        Ok(())
    }
}

/// Whether `hash` has the shape of a block hash (64 lowercase hex digits).
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

pub fn block_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[async_trait::async_trait]
impl Node for LocalNode {
    fn peer_id(&self) -> &str {
        &self.peer_id
    }

    fn is_online(&self) -> bool {
        self.online
    }

    async fn put_block(&self, data: Bytes) -> Result<String, NodeError> {
        self.ensure_open()?;

        let hash = block_hash(&data);
        let path = self.blocks.join(&hash);
        if tokio::fs::try_exists(&path).await? {
            return Ok(hash);
        }

        let tmp = self.blocks.join(format!(".{}.{}", hash, uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(%hash, size = data.len(), "stored block");
        Ok(hash)
    }

    async fn get_block(&self, hash: &str) -> Result<Bytes, NodeError> {
        self.ensure_open()?;

        if !is_valid_hash(hash) {
            return Err(NodeError::InvalidHash(hash.to_string()));
        }
        match tokio::fs::read(self.blocks.join(hash)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(NodeError::BlockNotFound(hash.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<(), NodeError> {
        self.closed = true;
        Ok(())
    }
}
