//! # Bridge Configuration Module
//!
//! Provides configuration management for the Parse bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig` holding the backend SDK and the host capabilities the
//! bridge needs. It fails fast when a required capability is missing, before
//! any method is wrapped.
//!
//! ## Required Dependencies
//!
//! - `BackendSdk` - The SDK whose methods are wrapped
//! - `TaskSpawner` - Drives native SDK futures
//!
//! ## Optional Dependencies
//!
//! - `DigestCycle` - Host change detection (default: no-op)
//! - `Injector` - Service lookup for named interceptors (default: empty
//!   [`ServiceRegistry`])
//!
//! When the `local-defaults` feature is enabled, the Tokio-backed spawner from
//! `bridge-local` is injected automatically if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .sdk(Arc::new(MyBackend::new()))
//!     .spawner(Arc::new(MySpawner))
//!     .digest(Arc::new(MyDigest))
//!     .enable_enhancements(true)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::services::ServiceRegistry;
use bridge_traits::{BackendSdk, DigestCycle, Injector, TaskSpawner};
use std::sync::Arc;

/// Bridge configuration.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Backend SDK whose methods are wrapped (required)
    pub sdk: Arc<dyn BackendSdk>,

    /// Executor for native SDK futures (required)
    pub spawner: Arc<dyn TaskSpawner>,

    /// Host change-detection trigger
    pub digest: Arc<dyn DigestCycle>,

    /// Service lookup for named interceptors
    pub injector: Arc<dyn Injector>,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("sdk", &"BackendSdk { ... }")
            .field("spawner", &"TaskSpawner { ... }")
            .field("digest", &"DigestCycle { ... }")
            .field("injector", &"Injector { ... }")
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Install the class registry (accessor generation) and pagination
    /// helpers on top of the wrapped surface
    pub enable_enhancements: bool,

    /// Emit a debug event for every wrapped call
    pub trace_calls: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_enhancements: true,
            trace_calls: true,
        }
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }
}

struct NoDigest;

impl DigestCycle for NoDigest {
    fn schedule_digest(&self) {}
}

fn sdk_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "BackendSdk".to_string(),
        message: "The backend SDK was not loaded. \
                 Inject an SDK implementation with .sdk() before building the bridge."
            .to_string(),
    }
}

#[cfg(not(feature = "local-defaults"))]
fn provide_default_spawner() -> Result<Arc<dyn TaskSpawner>> {
    Err(Error::CapabilityMissing {
        capability: "TaskSpawner".to_string(),
        message: "A TaskSpawner is required to drive native SDK futures. \
                 Enable the 'local-defaults' feature to use the Tokio spawner, \
                 or inject the host framework's executor with .spawner()."
            .to_string(),
    })
}

#[cfg(feature = "local-defaults")]
fn provide_default_spawner() -> Result<Arc<dyn TaskSpawner>> {
    use bridge_local::TokioTaskSpawner;

    let spawner: Arc<dyn TaskSpawner> = Arc::new(TokioTaskSpawner::new());
    Ok(spawner)
}

/// Builder for [`BridgeConfig`].
#[derive(Default)]
pub struct BridgeConfigBuilder {
    sdk: Option<Arc<dyn BackendSdk>>,
    spawner: Option<Arc<dyn TaskSpawner>>,
    digest: Option<Arc<dyn DigestCycle>>,
    injector: Option<Arc<dyn Injector>>,
    features: FeatureFlags,
}

impl BridgeConfigBuilder {
    /// Sets the backend SDK (required).
    pub fn sdk(mut self, sdk: Arc<dyn BackendSdk>) -> Self {
        self.sdk = Some(sdk);
        self
    }

    /// Sets the task spawner used to drive native futures.
    pub fn spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Sets the host digest cycle.
    pub fn digest(mut self, digest: Arc<dyn DigestCycle>) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Sets the injector named interceptors are resolved from.
    pub fn injector(mut self, injector: Arc<dyn Injector>) -> Self {
        self.injector = Some(injector);
        self
    }

    pub fn enable_enhancements(mut self, enabled: bool) -> Self {
        self.features.enable_enhancements = enabled;
        self
    }

    pub fn trace_calls(mut self, enabled: bool) -> Self {
        self.features.trace_calls = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `BridgeConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no SDK was provided, or no
    /// spawner was provided and no default is available.
    pub fn build(self) -> Result<BridgeConfig> {
        let sdk = self.sdk.ok_or_else(sdk_missing_error)?;

        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => provide_default_spawner()?,
        };

        let digest = self.digest.unwrap_or_else(|| Arc::new(NoDigest));
        let injector = self
            .injector
            .unwrap_or_else(|| Arc::new(ServiceRegistry::new()));

        Ok(BridgeConfig {
            sdk,
            spawner,
            digest,
            injector,
            features: self.features,
        })
    }
}
