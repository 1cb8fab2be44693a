use std::error::Error;

use crate::request::Context;
use crate::response::{CommandError, Encoding, ErrorCode, Marshal, Response};

/// A single executable command.
///
/// Every command, whether it runs in this process or inside the daemon,
/// enters through [`Op::call`].
#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output: Marshal + 'static;

    /// Encoding used when the caller did not pick one.
    fn default_encoding(&self) -> Encoding {
        Encoding::Text
    }

    /// Classify a failure of this command.
    fn error_code(_error: &Self::Error) -> ErrorCode {
        ErrorCode::Normal
    }

    async fn execute(&self, ctx: &Context) -> Result<Self::Output, Self::Error>;

    async fn call(&self, ctx: &Context, path: Vec<String>, encoding: Encoding) -> Response {
        match self.execute(ctx).await {
            Ok(output) => Response::output(path, Box::new(output), encoding),
            Err(e) => {
                let code = Self::error_code(&e);
                tracing::debug!(path = ?path, ?code, error = %e, "command failed");
                Response::failure(path, CommandError::new(e.to_string(), code))
            }
        }
    }
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(clap::Subcommand, Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Command {
            $($variant($type),)*
        }

        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            fn default_encoding(&self) -> $crate::response::Encoding {
                match self {
                    $(Command::$variant(op) => $crate::op::Op::default_encoding(op),)*
                }
            }

            fn error_code(error: &Self::Error) -> $crate::response::ErrorCode {
                match error {
                    $(OpError::$variant(e) => <$type as $crate::op::Op>::error_code(e),)*
                }
            }

            async fn execute(&self, ctx: &$crate::request::Context) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            $crate::op::Op::execute(op, ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl $crate::response::Marshal for OpOutput {
            fn marshal(
                self: Box<Self>,
                encoding: $crate::response::Encoding,
            ) -> Result<$crate::response::ByteStream, $crate::response::MarshalError> {
                match *self {
                    $(
                        OpOutput::$variant(output) => {
                            $crate::response::Marshal::marshal(Box::new(output), encoding)
                        }
                    )*
                }
            }
        }
    };
}
