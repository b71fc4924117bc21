//! Deferred/promise pairs

use bridge_traits::{CallError, DigestCycle, SdkError};
use core_async::sync::oneshot;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;

/// The deferred was dropped without being settled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deferred was dropped before it settled")]
pub struct Abandoned;

impl From<Abandoned> for SdkError {
    fn from(err: Abandoned) -> Self {
        SdkError::other(err.to_string())
    }
}

impl From<Abandoned> for CallError {
    fn from(err: Abandoned) -> Self {
        SdkError::from(err).into()
    }
}

/// The writable half: settles its [`HostPromise`] exactly once.
pub struct Deferred<T, E> {
    sender: oneshot::Sender<Result<T, E>>,
    digest: Arc<dyn DigestCycle>,
}

impl<T, E> Deferred<T, E> {
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(self, error: E) {
        self.settle(Err(error));
    }

    /// Hand the outcome to the promise, then run a digest.
    pub fn settle(self, outcome: Result<T, E>) {
        let resolved = outcome.is_ok();
        if self.sender.send(outcome).is_err() {
            // Nobody is waiting any more; there is nothing to digest.
            tracing::trace!(resolved, "Deferred settled after its promise was dropped");
            return;
        }
        tracing::trace!(resolved, "Deferred settled");
        self.digest.schedule_digest();
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// The readable half of a [`Deferred`].
///
/// Resolves with whatever the deferred was settled with, or with
/// `E::from(Abandoned)` if the deferred was dropped unsettled.
pub struct HostPromise<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for HostPromise<T, E>
where
    E: From<Abandoned>,
{
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(Abandoned.into())))
    }
}

impl<T, E> fmt::Debug for HostPromise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostPromise").finish_non_exhaustive()
    }
}

/// Create a linked deferred/promise pair.
pub fn defer<T, E>(digest: Arc<dyn DigestCycle>) -> (Deferred<T, E>, HostPromise<T, E>) {
    let (sender, receiver) = oneshot::channel();
    (Deferred { sender, digest }, HostPromise { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Digest {}

        impl DigestCycle for Digest {
            fn schedule_digest(&self);
        }
    }

    fn digest_expecting(times: usize) -> Arc<dyn DigestCycle> {
        let mut digest = MockDigest::new();
        digest.expect_schedule_digest().times(times).return_const(());
        Arc::new(digest)
    }

    #[core_async::test]
    async fn test_resolve_settles_promise_and_digests() {
        let (deferred, promise) = defer::<u32, SdkError>(digest_expecting(1));
        deferred.resolve(7);
        assert_eq!(promise.await.unwrap(), 7);
    }

    #[core_async::test]
    async fn test_reject_settles_promise_and_digests() {
        let (deferred, promise) = defer::<u32, SdkError>(digest_expecting(1));
        deferred.reject(SdkError::object_not_found("gone"));
        let err = promise.await.unwrap_err();
        assert_eq!(err.code, SdkError::OBJECT_NOT_FOUND);
    }

    #[core_async::test]
    async fn test_dropped_deferred_abandons_promise() {
        let (deferred, promise) = defer::<u32, CallError>(digest_expecting(0));
        drop(deferred);
        let err = promise.await.unwrap_err();
        assert!(err.message().contains("dropped before it settled"));
        assert!(err.object.is_none());
    }

    #[test]
    fn test_settle_after_promise_dropped_skips_digest() {
        let (deferred, promise) = defer::<u32, SdkError>(digest_expecting(0));
        drop(promise);
        deferred.resolve(1);
    }

    #[test]
    fn test_deferred_debug_reports_closed() {
        let (deferred, promise) = defer::<u32, SdkError>(digest_expecting(0));
        assert!(format!("{:?}", deferred).contains("closed: false"));
        drop(promise);
        assert!(format!("{:?}", deferred).contains("closed: true"));
    }
}
