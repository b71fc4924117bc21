//! Host framework contracts
//!
//! The host framework owns three things the bridge relies on: an executor for
//! native SDK futures, a digest (change-detection) cycle that must run whenever
//! a bridged promise settles, and a dependency injector used to resolve
//! interceptors by name.

use futures::future::BoxFuture;
use std::any::Any;
use std::sync::Arc;

/// Drives futures to completion on the host's executor.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::host::TaskSpawner;
///
/// fn fire(spawner: &dyn TaskSpawner) {
///     spawner.spawn(Box::pin(async {
///         // native SDK work
///     }));
/// }
/// ```
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// The host's change-detection trigger.
///
/// Called once every time a bridged deferred settles, after the value or
/// error has been handed to the promise.
pub trait DigestCycle: Send + Sync {
    fn schedule_digest(&self);
}

/// Named service lookup.
///
/// Interceptors registered by name are fetched through the injector and
/// downcast to the interceptor type. Factories receive the injector so they
/// can pull in whatever other services they need.
pub trait Injector: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl dyn Injector + '_ {
    /// Look up a service and downcast it to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name)?.downcast::<T>().ok()
    }
}
