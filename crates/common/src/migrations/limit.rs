use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

/// Wraps a byte stream and ends it once `limit` bytes have been yielded,
/// even if the inner stream has more to give.
///
/// Reaching the limit, exhausting the inner stream, or calling [`close`]
/// drops the inner stream, which releases the underlying connection.
///
/// [`close`]: LimitReadCloser::close
pub struct LimitReadCloser<S> {
    inner: Option<S>,
    remaining: u64,
}

impl<S> LimitReadCloser<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner: Some(inner),
            remaining: limit,
        }
    }

    /// Bytes left before the stream is cut off.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Release the inner stream. Safe to call more than once.
    pub fn close(&mut self) {
        self.inner.take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<S, E> Stream for LimitReadCloser<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            this.close();
            return Poll::Ready(None);
        }
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match Pin::new(inner).poll_next(cx) {
            Poll::Ready(Some(Ok(mut chunk))) => {
                if chunk.len() as u64 > this.remaining {
                    chunk.truncate(this.remaining as usize);
                }
                this.remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => {
                this.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
