use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::help::HelpContext;
use crate::lifecycle::ExitStatus;
use crate::response::{ReadError, Response};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to open response: {0}")]
    Open(#[from] ReadError),
}

/// Write a response to the terminal.
///
/// Errors go to `err` as `ERROR: <message>` and a blank line, followed by
/// help for the command path when the error is a usage error. Output is
/// copied to `out` verbatim; copy failures are logged, not reported.
pub async fn render<O, E>(
    response: Response,
    help: &HelpContext,
    out: &mut O,
    err: &mut E,
) -> Result<ExitStatus, RenderError>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    if let Some(error) = response.error() {
        let mut text = format!("ERROR: {}\n\n", error.message);
        if error.is_client_error() {
            match help.text(response.path()) {
                Ok(help) => text.push_str(&help),
                Err(e) => tracing::warn!("failed to generate help: {}", e),
            }
        }
        if let Err(e) = write_flush(err, text.as_bytes()).await {
            tracing::warn!("failed to write error: {}", e);
        }
        return Ok(ExitStatus::Failure);
    }

    let mut stream = response.reader()?;
    let mut copied = 0usize;
    while let Some(chunk) = stream.next().await {
        let written = match chunk {
            Ok(chunk) => out.write_all(&chunk).await.map(|_| chunk.len()),
            Err(e) => Err(e),
        };
        match written {
            Ok(n) => copied += n,
            Err(e) => {
                tracing::warn!(copied, "output copy interrupted: {}", e);
                break;
            }
        }
    }
    if let Err(e) = out.flush().await {
        tracing::warn!("failed to flush output: {}", e);
    }

    Ok(ExitStatus::Success)
}

async fn write_flush<W: AsyncWrite + Unpin>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    w.write_all(bytes).await?;
    w.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{self, CommandError, ErrorCode};

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_success_streams_verbatim() {
        let help = HelpContext::new();
        let response = Response::stream(path(&["cat"]), response::once(&b"raw\x00bytes"[..]));
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let status = render(response, &help, &mut out, &mut err).await.unwrap();
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(out, b"raw\x00bytes");
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn test_normal_error_has_no_help() {
        let help = HelpContext::new();
        let error = CommandError::new("block not found", ErrorCode::Normal);
        let response = Response::failure(path(&["cat"]), error);
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let status = render(response, &help, &mut out, &mut err).await.unwrap();
        assert_eq!(status, ExitStatus::Failure);
        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).unwrap(), "ERROR: block not found\n\n");
    }

    #[tokio::test]
    async fn test_client_error_appends_help() {
        let help = HelpContext::new();
        let error = CommandError::new("invalid block hash", ErrorCode::Client);
        let response = Response::failure(path(&["cat"]), error);
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let status = render(response, &help, &mut out, &mut err).await.unwrap();
        assert_eq!(status, ExitStatus::Failure);
        let err = String::from_utf8(err).unwrap();
        assert!(err.starts_with("ERROR: invalid block hash\n\n"));
        assert!(err.contains("Usage: ipfs cat"), "{}", err);
    }

    #[tokio::test]
    async fn test_stream_error_is_best_effort() {
        let help = HelpContext::new();
        let chunks = vec![
            Ok(bytes::Bytes::from_static(b"partial")),
            Err(std::io::Error::other("reset")),
            Ok(bytes::Bytes::from_static(b"never")),
        ];
        let response = Response::stream(path(&["cat"]), futures::stream::iter(chunks).boxed());
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let status = render(response, &help, &mut out, &mut err).await.unwrap();
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(out, b"partial");
    }
}
