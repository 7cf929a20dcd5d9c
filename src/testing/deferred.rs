//! Operations whose settlement the test controls.
//!
//! ```ignore
//! let (resolver, op) = deferred::<u32, String>();
//! let handle = controller.run(move || op);
//! resolver.resolve(42);
//! handle.await.unwrap();
//! ```

use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Create a linked [`Resolver`] / [`Deferred`] pair.
pub fn deferred<T, E>() -> (Resolver<T, E>, Deferred<T, E>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Deferred { rx })
}

/// An operation that has already succeeded.
pub fn resolve_with<T, E>(value: T) -> Ready<Result<T, E>> {
    ready(Ok(value))
}

/// An operation that has already failed.
pub fn reject_with<T, E>(error: E) -> Ready<Result<T, E>> {
    ready(Err(error))
}

/// Settles the paired [`Deferred`].
#[derive(Debug)]
pub struct Resolver<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Resolver<T, E> {
    /// Settle with success. Returns `false` if the operation was dropped.
    pub fn resolve(self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with failure. Returns `false` if the operation was dropped.
    pub fn reject(self, error: E) -> bool {
        self.settle(Err(error))
    }

    pub fn settle(self, outcome: Result<T, E>) -> bool {
        self.tx.send(outcome).is_ok()
    }
}

/// Future that completes when its [`Resolver`] settles it. If the resolver is
/// dropped unsettled, it never completes.
#[derive(Debug)]
pub struct Deferred<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) | Poll::Pending => Poll::Pending,
        }
    }
}
