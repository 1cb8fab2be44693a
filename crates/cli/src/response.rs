use std::fmt;
use std::io;

use bytes::Bytes;
use clap::ValueEnum;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Output bytes of a command, either produced in-process or streamed from the daemon.
pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// The two output encodings a command can be rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Text,
    Json,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Text => write!(f, "text"),
            Encoding::Json => write!(f, "json"),
        }
    }
}

/// Turns a command's output value into bytes for a given encoding.
pub trait Marshal: Send {
    fn marshal(self: Box<Self>, encoding: Encoding) -> Result<ByteStream, MarshalError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("no marshaller found for encoding '{0}'")]
    Unsupported(Encoding),
    #[error("failed to encode output as json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode output as toml: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// A single-chunk stream over `bytes`.
pub fn once(bytes: impl Into<Bytes>) -> ByteStream {
    futures::stream::once(futures::future::ready(Ok(bytes.into()))).boxed()
}

/// Text marshalling: the value's `Display` followed by a newline.
pub fn text(value: &impl fmt::Display) -> ByteStream {
    once(format!("{}\n", value))
}

/// JSON marshalling, pretty printed with a trailing newline.
pub fn json(value: &impl Serialize) -> Result<ByteStream, MarshalError> {
    let mut buf = serde_json::to_vec_pretty(value)?;
    buf.push(b'\n');
    Ok(once(buf))
}

/// Classification of a command failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The command itself failed
    Normal,
    /// The caller used the command incorrectly; help text is shown
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
    pub code: ErrorCode,
}

impl CommandError {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.code == ErrorCode::Client
    }
}

enum Body {
    Value {
        output: Box<dyn Marshal>,
        encoding: Encoding,
    },
    Stream(ByteStream),
}

/// Result of executing a request: exactly one of an output body or an error.
pub struct Response {
    path: Vec<String>,
    outcome: Result<Body, CommandError>,
}

impl Response {
    /// An in-process output value, marshalled when the response is opened.
    pub fn output(path: Vec<String>, output: Box<dyn Marshal>, encoding: Encoding) -> Self {
        Self {
            path,
            outcome: Ok(Body::Value { output, encoding }),
        }
    }

    /// Already encoded output, as received from the daemon.
    pub fn stream(path: Vec<String>, stream: ByteStream) -> Self {
        Self {
            path,
            outcome: Ok(Body::Stream(stream)),
        }
    }

    pub fn failure(path: Vec<String>, error: CommandError) -> Self {
        Self {
            path,
            outcome: Err(error),
        }
    }

    /// Command path the response answers.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn error(&self) -> Option<&CommandError> {
        self.outcome.as_ref().err()
    }

    /// Open the success body for reading.
    ///
    /// Responses carrying an error yield [`ReadError::Failed`].
    pub fn reader(self) -> Result<ByteStream, ReadError> {
        match self.outcome {
            Ok(Body::Value { output, encoding }) => Ok(output.marshal(encoding)?),
            Ok(Body::Stream(stream)) => Ok(stream),
            Err(error) => Err(ReadError::Failed(error)),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match &self.outcome {
            Ok(Body::Value { encoding, .. }) => format!("value ({})", encoding),
            Ok(Body::Stream(_)) => "stream".to_string(),
            Err(e) => format!("error ({:?}): {}", e.code, e.message),
        };
        f.debug_struct("Response")
            .field("path", &self.path)
            .field("outcome", &outcome)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error("response carries an error: {0}")]
    Failed(CommandError),
}
