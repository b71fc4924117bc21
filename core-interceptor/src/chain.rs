use crate::interceptor::{ErrorHandler, Interceptor, InterceptorEntry, SuccessHandler};
use bridge_traits::{BridgedFuture, CallError, Injector, Payload, Receiver};
use core_promise::Thenable;
use core_runtime::Result;
use futures::future::{self, FutureExt, TryFutureExt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolved interceptors, split by capability. Immutable once assembled.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    names: Vec<String>,
    success: Vec<SuccessHandler>,
    error: Vec<ErrorHandler>,
}

impl InterceptorChain {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve every entry, in order, exactly once.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownService`](core_runtime::Error::UnknownService) for a
    /// name the injector cannot provide as an [`Interceptor`]; a factory's own
    /// error is returned as is.
    pub fn assemble(entries: &[InterceptorEntry], injector: &dyn Injector) -> Result<Self> {
        let mut interceptors = Vec::with_capacity(entries.len());
        for entry in entries {
            let interceptor = entry.resolve(injector)?;
            debug!(interceptor = interceptor.name(), "Resolved interceptor");
            interceptors.push(interceptor);
        }

        let chain = Self::from_interceptors(interceptors);
        info!(
            interceptors = chain.names.len(),
            success_handlers = chain.success.len(),
            error_handlers = chain.error.len(),
            "Interceptor chain assembled"
        );
        Ok(chain)
    }

    pub fn from_interceptors(interceptors: impl IntoIterator<Item = Interceptor>) -> Self {
        let mut chain = Self::empty();
        for interceptor in interceptors {
            if let Some(handler) = interceptor.success_handler() {
                chain.success.push(Arc::clone(handler));
            }
            if let Some(handler) = interceptor.error_handler() {
                chain.error.push(Arc::clone(handler));
            }
            chain.names.push(interceptor.name().to_string());
        }
        chain
    }

    /// Interceptor names in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn success_len(&self) -> usize {
        self.success.len()
    }

    pub fn error_len(&self) -> usize {
        self.error.len()
    }

    /// Thread `value` through every success handler.
    pub fn run_success(&self, value: Payload) -> BridgedFuture {
        self.success
            .iter()
            .cloned()
            .fold(future::ok(value).boxed(), |acc, handler| {
                acc.and_then(move |value| handler(value)).boxed()
            })
    }

    /// Annotate `error` with the receiver of the failing call and thread it
    /// through every error handler.
    pub fn run_error(&self, receiver: Receiver, mut error: CallError) -> BridgedFuture {
        error.object = Some(receiver);
        self.error
            .iter()
            .cloned()
            .fold(future::err(error).boxed(), |acc, handler| {
                acc.or_else(move |error| handler(error)).boxed()
            })
    }

    /// Attach both chains to a pending call.
    ///
    /// A failure anywhere before the error chain (the call itself or any
    /// success handler) enters the error chain.
    pub fn run<F>(self: &Arc<Self>, receiver: Receiver, pending: F) -> BridgedFuture
    where
        F: Thenable<Payload, CallError> + 'static,
    {
        let on_success = Arc::clone(self);
        let on_error = Arc::clone(self);
        pending
            .and_then(move |value| on_success.run_success(value))
            .or_else(move |error| on_error.run_error(receiver, error))
            .boxed()
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names)
            .field("success_handlers", &self.success.len())
            .field("error_handlers", &self.error.len())
            .finish()
    }
}
