use clap::Args;
use serde::{Deserialize, Serialize};

use crate::response::{self, ByteStream, Encoding, ErrorCode, Marshal, MarshalError};

/// Print the configuration, or a single value by dotted key (e.g. addresses.api)
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigShow {
    /// Dotted key to look up; keys match case-insensitively
    pub key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigShowError {
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("no config value at key {0:?}")]
    UnknownKey(String),
}

#[derive(Debug)]
pub struct ConfigValue(pub toml::Value);

impl Marshal for ConfigValue {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError> {
        match (encoding, self.0) {
            (Encoding::Json, value) => response::json(&value),
            (Encoding::Text, toml::Value::String(s)) => Ok(response::text(&s)),
            (Encoding::Text, value @ toml::Value::Table(_)) => {
                Ok(response::once(toml::to_string_pretty(&value)?))
            }
            (Encoding::Text, value) => Ok(response::text(&value)),
        }
    }
}

/// Walk `key` segment by segment through nested tables.
pub fn lookup<'a>(root: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |value, segment| {
            value
                .as_table()?
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(segment))
                .map(|(_, value)| value)
        })
}

#[async_trait::async_trait]
impl crate::op::Op for ConfigShow {
    type Error = ConfigShowError;
    type Output = ConfigValue;

    fn error_code(error: &Self::Error) -> ErrorCode {
        match error {
            ConfigShowError::UnknownKey(_) => ErrorCode::Client,
            ConfigShowError::Encode(_) => ErrorCode::Normal,
        }
    }

    async fn execute(&self, ctx: &crate::request::Context) -> Result<Self::Output, Self::Error> {
        let root = toml::Value::try_from(&ctx.config)?;
        let Some(key) = &self.key else {
            return Ok(ConfigValue(root));
        };

        lookup(&root, key)
            .cloned()
            .map(ConfigValue)
            .ok_or_else(|| ConfigShowError::UnknownKey(key.clone()))
    }
}
