//! Adapting native futures onto the host runtime

use crate::deferred::{defer, Abandoned, Deferred, HostPromise};
use bridge_traits::{DigestCycle, TaskSpawner};
use futures::future::{self, Ready};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Anything that eventually yields a `Result`.
///
/// Host promises, native SDK futures and plain `async` blocks all qualify.
pub trait Thenable<T, E>: Future<Output = Result<T, E>> + Send {}

impl<F, T, E> Thenable<T, E> for F where F: Future<Output = Result<T, E>> + Send {}

/// An already-resolved thenable.
pub fn when<T, E>(value: T) -> Ready<Result<T, E>> {
    future::ok(value)
}

/// An already-rejected thenable.
pub fn reject<T, E>(error: E) -> Ready<Result<T, E>> {
    future::err(error)
}

/// The host framework's promise machinery.
#[derive(Clone)]
pub struct HostRuntime {
    spawner: Arc<dyn TaskSpawner>,
    digest: Arc<dyn DigestCycle>,
}

impl HostRuntime {
    pub fn new(spawner: Arc<dyn TaskSpawner>, digest: Arc<dyn DigestCycle>) -> Self {
        Self { spawner, digest }
    }

    pub fn digest(&self) -> &Arc<dyn DigestCycle> {
        &self.digest
    }

    /// A fresh deferred whose settlement triggers this host's digest.
    pub fn defer<T, E>(&self) -> (Deferred<T, E>, HostPromise<T, E>) {
        defer(Arc::clone(&self.digest))
    }

    /// Turn a native future into a host promise.
    ///
    /// The native future runs on the host spawner. Its value or error is
    /// forwarded unchanged to the single deferred created for this call.
    pub fn adapt<F, T, E>(&self, native: F) -> HostPromise<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<Abandoned> + Send + 'static,
    {
        let (deferred, promise) = self.defer();
        self.spawner.spawn(Box::pin(async move {
            deferred.settle(native.await);
        }));
        promise
    }
}

impl fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRuntime")
            .field("spawner", &"TaskSpawner { ... }")
            .field("digest", &"DigestCycle { ... }")
            .finish()
    }
}
