//! Service façade and provider.
//!
//! [`ParseProvider`] collects everything the bridge is configured with (the
//! backend SDK, host capabilities, interceptor entries, feature flags) and
//! [`ParseProvider::build`] assembles it into a [`ParseService`]: the
//! interceptor chain is resolved, every registered SDK method is wrapped, and
//! the typed façades are handed out from the result.
//!
//! ```ignore
//! use core_service::ParseProvider;
//!
//! let provider = ParseProvider::new()
//!     .sdk(sdk)
//!     .spawner(spawner)
//!     .digest(digest)
//!     .push_interceptor("sessionRefresher");
//! provider.initialize(&[json!("app-id"), json!("js-key")])?;
//!
//! let parse = provider.build()?;
//! let saved = parse.objects().save(score).await?;
//! ```

pub mod error;

pub use error::{Result, ServiceError};

use bridge_traits::{BackendSdk, DigestCycle, Injector, Query, TaskSpawner};
use core_enhance::{ClassDescriptor, ClassRegistry, ObjectClass, PagedQuery};
use core_interceptor::{Interceptor, InterceptorChain, InterceptorEntry};
use core_patch::{
    Analytics, AppConfig, Cloud, Files, GeoPoints, Objects, PatchedSdk, Push, Queries, Sessions,
    Users,
};
use core_promise::HostRuntime;
use core_runtime::{BridgeConfig, Error as SetupError, FeatureFlags};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "local-defaults")]
pub use bridge_local::{CountingDigest, MemoryBackend, NoopDigest, TokioTaskSpawner};

/// Configuration surface of the bridge.
#[derive(Default)]
pub struct ParseProvider {
    interceptors: Vec<InterceptorEntry>,
    sdk: Option<Arc<dyn BackendSdk>>,
    spawner: Option<Arc<dyn TaskSpawner>>,
    digest: Option<Arc<dyn DigestCycle>>,
    injector: Option<Arc<dyn Injector>>,
    features: FeatureFlags,
}

impl ParseProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the interceptor list.
    pub fn interceptors<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<InterceptorEntry>,
    {
        self.interceptors = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Append one interceptor: a service name or an [`InterceptorEntry`].
    pub fn push_interceptor(mut self, entry: impl Into<InterceptorEntry>) -> Self {
        self.interceptors.push(entry.into());
        self
    }

    /// Append an interceptor built from the injector when the service is
    /// assembled.
    pub fn with_interceptor_factory<F>(self, factory: F) -> Self
    where
        F: Fn(&dyn Injector) -> core_runtime::Result<Interceptor> + Send + Sync + 'static,
    {
        self.push_interceptor(InterceptorEntry::factory(factory))
    }

    pub fn interceptor_entries(&self) -> &[InterceptorEntry] {
        &self.interceptors
    }

    pub fn sdk(mut self, sdk: Arc<dyn BackendSdk>) -> Self {
        self.sdk = Some(sdk);
        self
    }

    pub fn spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    pub fn digest(mut self, digest: Arc<dyn DigestCycle>) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn injector(mut self, injector: Arc<dyn Injector>) -> Self {
        self.injector = Some(injector);
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn enable_enhancements(mut self, enabled: bool) -> Self {
        self.features.enable_enhancements = enabled;
        self
    }

    /// Forward `args` to the SDK's own initialization, unchanged.
    ///
    /// # Errors
    ///
    /// [`SetupError::CapabilityMissing`] when no SDK is configured yet;
    /// [`SetupError::Initialization`] with the SDK's error when it refuses
    /// the arguments.
    pub fn initialize(&self, args: &[Value]) -> Result<()> {
        let sdk = self.sdk.as_ref().ok_or_else(|| SetupError::CapabilityMissing {
            capability: "BackendSdk".to_string(),
            message: "Configure the SDK with .sdk() before initializing it.".to_string(),
        })?;
        sdk.initialize(args).map_err(SetupError::from)?;
        Ok(())
    }

    /// Assemble the interceptor chain and wrap the SDK.
    ///
    /// # Errors
    ///
    /// Any setup failure: a missing capability, an interceptor that cannot be
    /// resolved, or an SDK that lacks a registered method. Nothing is wrapped
    /// when this fails.
    pub fn build(&self) -> Result<ParseService> {
        let mut builder = BridgeConfig::builder().features(self.features);
        if let Some(sdk) = &self.sdk {
            builder = builder.sdk(Arc::clone(sdk));
        }
        if let Some(spawner) = &self.spawner {
            builder = builder.spawner(Arc::clone(spawner));
        }
        if let Some(digest) = &self.digest {
            builder = builder.digest(Arc::clone(digest));
        }
        if let Some(injector) = &self.injector {
            builder = builder.injector(Arc::clone(injector));
        }
        let config = builder.build()?;

        let chain = InterceptorChain::assemble(&self.interceptors, config.injector.as_ref())?;
        let host = HostRuntime::new(config.spawner, config.digest);
        let sdk = PatchedSdk::patch_with_flags(config.sdk, Arc::new(chain), host, config.features)?;

        let classes = config
            .features
            .enable_enhancements
            .then(|| Arc::new(ClassRegistry::new()));

        info!(
            interceptors = self.interceptors.len(),
            methods = sdk.patched_methods().len(),
            enhancements = classes.is_some(),
            "Parse service ready"
        );
        Ok(ParseService { sdk, classes })
    }
}

impl fmt::Debug for ParseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseProvider")
            .field("interceptors", &self.interceptors)
            .field("sdk", &self.sdk.is_some())
            .field("spawner", &self.spawner.is_some())
            .field("digest", &self.digest.is_some())
            .field("injector", &self.injector.is_some())
            .field("features", &self.features)
            .finish()
    }
}

/// The wrapped SDK, as handed to host code.
///
/// Cheap to clone. Every façade dispatches through the same patched SDK and
/// interceptor chain.
#[derive(Debug, Clone)]
pub struct ParseService {
    sdk: Arc<PatchedSdk>,
    classes: Option<Arc<ClassRegistry>>,
}

impl ParseService {
    pub fn patched(&self) -> &Arc<PatchedSdk> {
        &self.sdk
    }

    pub fn objects(&self) -> Objects {
        Objects::new(Arc::clone(&self.sdk))
    }

    pub fn queries(&self) -> Queries {
        Queries::new(Arc::clone(&self.sdk))
    }

    pub fn users(&self) -> Users {
        Users::new(Arc::clone(&self.sdk))
    }

    pub fn sessions(&self) -> Sessions {
        Sessions::new(Arc::clone(&self.sdk))
    }

    pub fn cloud(&self) -> Cloud {
        Cloud::new(Arc::clone(&self.sdk))
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::new(Arc::clone(&self.sdk))
    }

    pub fn push(&self) -> Push {
        Push::new(Arc::clone(&self.sdk))
    }

    pub fn geo_points(&self) -> GeoPoints {
        GeoPoints::new(Arc::clone(&self.sdk))
    }

    pub fn analytics(&self) -> Analytics {
        Analytics::new(Arc::clone(&self.sdk))
    }

    pub fn files(&self) -> Files {
        Files::new(Arc::clone(&self.sdk))
    }

    pub fn enhancements_enabled(&self) -> bool {
        self.classes.is_some()
    }

    /// The class registry.
    ///
    /// # Errors
    ///
    /// [`ServiceError::EnhancementsDisabled`] when the service was built
    /// without enhancements.
    pub fn classes(&self) -> Result<&Arc<ClassRegistry>> {
        self.classes.as_ref().ok_or(ServiceError::EnhancementsDisabled)
    }

    /// Define a class. See [`ClassRegistry::extend`].
    pub fn extend(&self, descriptor: impl Into<ClassDescriptor>) -> Result<Arc<ObjectClass>> {
        Ok(self.classes()?.extend(descriptor)?)
    }

    pub fn get_class(&self, class_name: &str) -> Result<Option<Arc<ObjectClass>>> {
        Ok(self.classes()?.get_class(class_name))
    }

    /// A paginated view of `query`.
    pub fn paged(&self, query: Query) -> Result<PagedQuery> {
        self.classes()?;
        Ok(PagedQuery::new(self.queries(), query))
    }
}
