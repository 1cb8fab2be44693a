use std::fmt;
use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use common::config::{DEFAULT_API_ADDRESS, DEFAULT_GATEWAY_ADDRESS};
use common::prelude::{dial_args, AddrError, Config};

use crate::response::{self, ByteStream, Encoding, ErrorCode, Marshal, MarshalError};
use crate::state::{self, StateError};

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Init {
    /// Multiaddr the daemon API listens on
    #[arg(long, default_value = DEFAULT_API_ADDRESS)]
    pub api_addr: String,

    /// Multiaddr the daemon gateway listens on
    #[arg(long, default_value = DEFAULT_GATEWAY_ADDRESS)]
    pub gateway_addr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    State(#[from] StateError),
    #[error("invalid address: {0}")]
    Address(#[from] AddrError),
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub config_root: PathBuf,
    pub config_path: PathBuf,
    pub blocks_path: PathBuf,
    pub peer_id: String,
    pub api_addr: String,
    pub gateway_addr: String,
}

impl fmt::Display for InitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Initialized ipfs node at: {}\n\
             - Peer identity: {}\n\
             - Config: {}\n\
             - Blocks: {}\n\
             - API address: {}\n\
             - Gateway address: {}",
            self.config_root.display(),
            self.peer_id,
            self.config_path.display(),
            self.blocks_path.display(),
            self.api_addr,
            self.gateway_addr,
        )
    }
}

impl Marshal for InitOutput {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match encoding {
            Encoding::Text => Ok(response::text(&self)),
            Encoding::Json => response::json(&self),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = InitOutput;

    fn error_code(error: &Self::Error) -> ErrorCode {
        match error {
            InitError::Address(_) => ErrorCode::Client,
            InitError::State(_) => ErrorCode::Normal,
        }
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        // both addresses must be dialable before anything is written
        dial_args(&self.api_addr)?;
        dial_args(&self.gateway_addr)?;

        let mut config = Config::default();
        config.addresses.api = self.api_addr.clone();
        config.addresses.gateway = self.gateway_addr.clone();

        let root = state::init(&ctx.config_root, config)?;
        tracing::info!(root = %root.config_root.display(), "initialized config root");

        Ok(InitOutput {
            config_root: root.config_root,
            config_path: root.config_path,
            blocks_path: root.blocks_path,
            peer_id: root.config.identity.peer_id,
            api_addr: root.config.addresses.api,
            gateway_addr: root.config.addresses.gateway,
        })
    }
}
