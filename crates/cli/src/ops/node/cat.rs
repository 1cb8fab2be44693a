use bytes::Bytes;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::node::NodeError;
use crate::response::{self, ByteStream, Encoding, ErrorCode, Marshal, MarshalError};

/// Print the contents of a block
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Cat {
    /// Hash of the block to print
    pub hash: String,
}

/// Raw block contents, written out unchanged for either encoding.
#[derive(Debug)]
pub struct CatOutput(pub Bytes);

impl Marshal for CatOutput {
    fn marshal(self: Box<Self>, _encoding: Encoding) -> Result<ByteStream, MarshalError> {
        Ok(response::once(self.0))
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Cat {
    type Error = NodeError;
    type Output = CatOutput;

    fn error_code(error: &Self::Error) -> ErrorCode {
        match error {
            NodeError::InvalidHash(_) => ErrorCode::Client,
            _ => ErrorCode::Normal,
        }
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        let node = ctx.node()?;
        let data = node.get_block(&self.hash).await?;
        Ok(CatOutput(data))
    }
}
