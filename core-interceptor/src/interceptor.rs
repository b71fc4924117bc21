use bridge_traits::{BridgedFuture, CallError, CallResult, Injector, Payload};
use core_runtime::{Error, Result};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Transforms the value of a successful call.
pub type SuccessHandler = Arc<dyn Fn(Payload) -> BridgedFuture + Send + Sync>;

/// Observes, replaces or recovers from a failed call.
pub type ErrorHandler = Arc<dyn Fn(CallError) -> BridgedFuture + Send + Sync>;

/// Builds an interceptor from the injector at assembly time.
pub type InterceptorFactory = Arc<dyn Fn(&dyn Injector) -> Result<Interceptor> + Send + Sync>;

/// A named pair of optional handlers.
#[derive(Clone)]
pub struct Interceptor {
    name: String,
    success: Option<SuccessHandler>,
    error: Option<ErrorHandler>,
}

impl Interceptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: None,
            error: None,
        }
    }

    pub fn on_success<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult<Payload>> + Send + 'static,
    {
        self.success = Some(Arc::new(move |value| handler(value).boxed()));
        self
    }

    pub fn on_error<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CallError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult<Payload>> + Send + 'static,
    {
        self.error = Some(Arc::new(move |error| handler(error).boxed()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn success_handler(&self) -> Option<&SuccessHandler> {
        self.success.as_ref()
    }

    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error.as_ref()
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("name", &self.name)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// One configured interceptor, before resolution.
#[derive(Clone)]
pub enum InterceptorEntry {
    /// Looked up in the injector and downcast to [`Interceptor`].
    Named(String),
    /// Invoked with the injector.
    Factory(InterceptorFactory),
}

impl InterceptorEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&dyn Injector) -> Result<Interceptor> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// A factory that ignores the injector and hands out a ready-made
    /// interceptor.
    pub fn instance(interceptor: Interceptor) -> Self {
        Self::factory(move |_| Ok(interceptor.clone()))
    }

    pub(crate) fn resolve(&self, injector: &dyn Injector) -> Result<Interceptor> {
        match self {
            Self::Named(name) if name.trim().is_empty() => Err(Error::InvalidArgument(
                "Interceptor name must not be empty".to_string(),
            )),
            Self::Named(name) => injector
                .get_as::<Interceptor>(name)
                .map(|interceptor| (*interceptor).clone())
                .ok_or_else(|| Error::UnknownService(name.clone())),
            Self::Factory(factory) => factory(injector),
        }
    }
}

impl From<&str> for InterceptorEntry {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for InterceptorEntry {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Debug for InterceptorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::ServiceRegistry;

    #[test]
    fn test_builder_sets_handlers() {
        let interceptor = Interceptor::new("audit").on_error(|err| async move { Err(err) });
        assert_eq!(interceptor.name(), "audit");
        assert!(interceptor.success_handler().is_none());
        assert!(interceptor.error_handler().is_some());
        assert_eq!(
            format!("{:?}", interceptor),
            "Interceptor { name: \"audit\", success: false, error: true }"
        );
    }

    #[test]
    fn test_named_entry_resolves_from_registry() {
        let registry = ServiceRegistry::new().with("audit", Interceptor::new("audit"));
        let resolved = InterceptorEntry::from("audit").resolve(&registry).unwrap();
        assert_eq!(resolved.name(), "audit");
    }

    #[test]
    fn test_named_entry_with_wrong_type_is_unknown() {
        let registry = ServiceRegistry::new().with("audit", 42u8);
        let err = InterceptorEntry::named("audit").resolve(&registry).unwrap_err();
        assert!(matches!(err, Error::UnknownService(name) if name == "audit"));
    }

    #[test]
    fn test_factory_receives_injector() {
        let registry = ServiceRegistry::new().with("prefix", String::from("audited"));
        let entry = InterceptorEntry::factory(|injector| {
            let prefix = injector
                .get_as::<String>("prefix")
                .ok_or_else(|| Error::UnknownService("prefix".to_string()))?;
            Ok(Interceptor::new(prefix.as_str()))
        });

        assert_eq!(entry.resolve(&registry).unwrap().name(), "audited");
        assert!(entry.resolve(&ServiceRegistry::new()).is_err());
    }
}
