use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use common::migrations::dist_path_from_env;
use common::prelude::{CancelToken, Config, HttpFetcher};

pub mod fetch;
pub mod versions;

use crate::op::Op;
use crate::response::{Encoding, ErrorCode};

crate::command_enum! {
    (Fetch, fetch::Fetch),
    (Versions, versions::Versions),
}

pub type MigrateCommand = Command;

/// Fetch repo migration payloads from a distribution gateway
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Migrate {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[async_trait::async_trait]
impl Op for Migrate {
    type Error = OpError;
    type Output = OpOutput;

    fn default_encoding(&self) -> Encoding {
        self.command.default_encoding()
    }

    fn error_code(error: &Self::Error) -> ErrorCode {
        MigrateCommand::error_code(error)
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Where and how migration payloads are fetched from.
///
/// Flags win over `IPFS_DIST_PATH`, which wins over the config file.
#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Source {
    /// Gateway origin (default https://ipfs.io)
    #[arg(long)]
    pub gateway: Option<String>,

    /// Distribution path on the gateway (default /ipns/dist.ipfs.tech)
    #[arg(long)]
    pub dist: Option<String>,

    /// Byte ceiling for the body; 0 selects 512 MiB, -1 disables it
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Option<i64>,

    /// Abort the fetch after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Source {
    pub fn fetcher(&self, config: &Config) -> HttpFetcher {
        self.fetcher_with_env(config, dist_path_from_env())
    }

    /// As [`Source::fetcher`], with the `IPFS_DIST_PATH` value supplied by the caller.
    pub fn fetcher_with_env(&self, config: &Config, env_dist: Option<String>) -> HttpFetcher {
        let migration = &config.migration;
        let dist = self
            .dist
            .clone()
            .or(env_dist.filter(|p| !p.is_empty()))
            .or_else(|| migration.dist_path.clone());
        let gateway = self.gateway.as_deref().or(migration.gateway.as_deref());

        HttpFetcher::new(
            dist.as_deref(),
            gateway,
            migration.user_agent.as_deref(),
            self.limit.unwrap_or(migration.fetch_limit),
        )
    }

    pub fn cancel_token(&self) -> CancelToken {
        match self.timeout {
            Some(secs) => CancelToken::with_deadline(Duration::from_secs(secs)),
            None => CancelToken::never(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.migration.gateway = Some("https://config.example".to_string());
        config.migration.dist_path = Some("/config/dist".to_string());
        config.migration.fetch_limit = 10;

        let source = Source {
            gateway: Some("http://127.0.0.1:9/".to_string()),
            dist: Some("flag/dist".to_string()),
            limit: Some(-1),
            timeout: None,
        };
        let fetcher = source.fetcher_with_env(&config, None);
        assert_eq!(fetcher.gateway(), "http://127.0.0.1:9");
        assert_eq!(fetcher.dist_path(), "/flag/dist");
        assert_eq!(fetcher.limit(), None);
    }

    #[test]
    fn test_dist_path_precedence() {
        let mut config = Config::default();
        config.migration.dist_path = Some("/config/dist".to_string());
        let env = || Some("/env/dist".to_string());

        let flagged = Source {
            dist: Some("/flag/dist".to_string()),
            ..Source::default()
        };
        assert_eq!(flagged.fetcher_with_env(&config, env()).dist_path(), "/flag/dist");

        let unflagged = Source::default();
        assert_eq!(unflagged.fetcher_with_env(&config, env()).dist_path(), "/env/dist");
        assert_eq!(
            unflagged.fetcher_with_env(&config, Some(String::new())).dist_path(),
            "/config/dist"
        );
        assert_eq!(unflagged.fetcher_with_env(&config, None).dist_path(), "/config/dist");

        assert_eq!(
            unflagged.fetcher_with_env(&Config::default(), None).dist_path(),
            "/ipns/dist.ipfs.tech"
        );
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let mut config = Config::default();
        config.migration.gateway = Some("https://config.example".to_string());
        config.migration.fetch_limit = 10;

        let fetcher = Source::default().fetcher_with_env(&config, None);
        assert_eq!(fetcher.gateway(), "https://config.example");
        assert_eq!(fetcher.limit(), Some(10));
    }
}
