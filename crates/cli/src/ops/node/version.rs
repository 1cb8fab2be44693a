use std::convert::Infallible;

use clap::Args;
use serde::{Deserialize, Serialize};

use common::prelude::build_info;
use common::version::BuildInfo;

use crate::response::{self, ByteStream, Encoding, Marshal, MarshalError};

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// Only print the version number
    #[arg(short, long)]
    pub number: bool,
}

#[derive(Debug)]
pub struct VersionOutput {
    pub info: BuildInfo,
    pub number_only: bool,
}

impl Marshal for VersionOutput {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match encoding {
            Encoding::Text if self.number_only => Ok(response::text(&self.info.package_version)),
            Encoding::Text => Ok(response::text(&self.info)),
            Encoding::Json => response::json(&self.info),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = Infallible;
    type Output = VersionOutput;

    async fn execute(&self, _ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        Ok(VersionOutput {
            info: build_info(),
            number_only: self.number,
        })
    }
}
