//! Named service registry
//!
//! A minimal [`Injector`] the host can populate with interceptors and the
//! services those interceptors depend on.
//!
//! ```ignore
//! use core_runtime::services::ServiceRegistry;
//!
//! let registry = ServiceRegistry::new()
//!     .with("sessionStore", SessionStore::default())
//!     .with("authInterceptor", auth_interceptor);
//! ```

use bridge_traits::Injector;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with<T: Any + Send + Sync>(self, name: impl Into<String>, service: T) -> Self {
        self.register(name, service);
        self
    }

    /// Register (or replace) a service under `name`.
    pub fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, service: T) {
        self.register_arc(name, Arc::new(service));
    }

    pub fn register_arc(&self, name: impl Into<String>, service: Arc<dyn Any + Send + Sync>) {
        let mut services = self.services.write().unwrap_or_else(|e| e.into_inner());
        services.insert(name.into(), service);
    }

    /// Fetch a service by name, failing with [`Error::UnknownService`] when it
    /// is missing or has another type.
    pub fn require<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)
            .and_then(|service| service.downcast::<T>().ok())
            .ok_or_else(|| Error::UnknownService(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let services = self.services.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = services.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Injector for ServiceRegistry {
    fn get(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        let services = self.services.read().unwrap_or_else(|e| e.into_inner());
        services.get(name).cloned()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish()
    }
}
