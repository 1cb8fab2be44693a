use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::sync::watch;

use super::FetchError;

type CancelFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Cancellation signal handed to fetch operations.
///
/// Cloning is cheap; every clone observes the same signal. A token whose
/// handle is dropped without cancelling is never cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// The sending side of a [`CancelToken`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_handle, token) = CancelHandle::new();
        token
    }

    /// A token cancelled once `after` elapses. Must be called within a tokio runtime.
    pub fn with_deadline(after: Duration) -> Self {
        let (handle, token) = CancelHandle::new();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            tracing::debug!(?after, "fetch deadline elapsed");
            handle.cancel();
        });
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            let cancelled = *rx.borrow_and_update();
            if cancelled {
                return;
            }
            if rx.changed().await.is_err() {
                // handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }

    fn cancelled_owned(&self) -> CancelFuture {
        let token = self.clone();
        Box::pin(async move { token.cancelled().await })
    }
}

/// Byte stream that fails with [`FetchError::Cancelled`] and drops its inner
/// stream as soon as the token fires.
pub struct Cancellable<S> {
    inner: Option<S>,
    cancelled: CancelFuture,
}

impl<S> Cancellable<S> {
    pub fn new(inner: S, token: &CancelToken) -> Self {
        Self {
            inner: Some(inner),
            cancelled: token.cancelled_owned(),
        }
    }
}

impl<S, E> Stream for Cancellable<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<FetchError>,
{
    type Item = Result<Bytes, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.inner = None;
            return Poll::Ready(Some(Err(FetchError::Cancelled)));
        }

        match Pin::new(inner).poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item.map_err(Into::into))),
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
