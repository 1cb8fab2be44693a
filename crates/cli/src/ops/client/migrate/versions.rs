use std::fmt;

use clap::Args;
use serde::{Deserialize, Serialize};

use common::migrations::{dist_versions, latest_dist_version, DistVersion};
use common::prelude::FetchError;

use super::Source;
use crate::response::{self, ByteStream, Encoding, Marshal, MarshalError};

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Versions {
    /// Distribution name (e.g. kubo, fs-repo-migrations)
    pub name: String,

    /// Only print the newest version
    #[arg(long)]
    pub latest: bool,

    /// Skip prereleases
    #[arg(long)]
    pub stable: bool,

    #[command(flatten)]
    pub source: Source,
}

#[derive(Debug)]
pub struct VersionList(pub Vec<DistVersion>);

impl fmt::Display for VersionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl Marshal for VersionList {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match encoding {
            Encoding::Text => Ok(response::text(&self)),
            Encoding::Json => {
                let versions: Vec<String> = self.0.iter().map(ToString::to_string).collect();
                response::json(&versions)
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Versions {
    type Error = FetchError;
    type Output = VersionList;

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        let fetcher = self.source.fetcher(&ctx.config);
        let cancel = self.source.cancel_token();

        if self.latest {
            let latest = latest_dist_version(&fetcher, &cancel, &self.name, self.stable).await?;
            return Ok(VersionList(vec![latest]));
        }

        let versions = dist_versions(&fetcher, &cancel, &self.name, false)
            .await?
            .into_iter()
            .filter(|v| !self.stable || !v.is_prerelease())
            .collect();
        Ok(VersionList(versions))
    }
}
