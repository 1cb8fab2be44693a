use clap::Args;
use serde::{Deserialize, Serialize};

use crate::node::NodeError;
use crate::response::{self, ByteStream, Encoding, Marshal, MarshalError};

/// Show the node's identity (JSON only)
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Id;

#[derive(Debug, Serialize)]
pub struct IdOutput {
    pub peer_id: String,
    pub online: bool,
    pub addresses: Vec<String>,
}

impl Marshal for IdOutput {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match encoding {
            Encoding::Json => response::json(&self),
            Encoding::Text => Err(MarshalError::Unsupported(Encoding::Text)),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Id {
    type Error = NodeError;
    type Output = IdOutput;

    fn default_encoding(&self) -> Encoding {
        Encoding::Json
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        let node = ctx.node()?;
        let addresses = &ctx.config.addresses;
        Ok(IdOutput {
            peer_id: node.peer_id().to_string(),
            online: node.is_online(),
            addresses: vec![addresses.api.clone(), addresses.gateway.clone()],
        })
    }
}
