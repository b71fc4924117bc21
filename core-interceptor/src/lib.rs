//! # Interceptor Chain
//!
//! Ordered success/error handlers applied to the result of every bridged
//! call.
//!
//! ## Overview
//!
//! Interceptors are registered as [`InterceptorEntry`] values: either a
//! service name resolved through the host [`Injector`], or a factory invoked
//! with the injector. [`InterceptorChain::assemble`] resolves every entry once
//! and splits the interceptors into a success sequence and an error sequence,
//! keeping registration order in both.
//!
//! At run time the settled value flows through the success handlers left to
//! right, each handler's output feeding the next. A rejection (or a failing
//! success handler) is annotated with the call's receiver and flows through
//! the error handlers the same way. An error handler recovers the call by
//! returning `Ok`.
//!
//! ```ignore
//! use core_interceptor::{Interceptor, InterceptorChain, InterceptorEntry};
//!
//! let audit = Interceptor::new("audit").on_error(|err| async move {
//!     tracing::warn!(code = err.code(), "call failed");
//!     Err(err)
//! });
//! let chain = InterceptorChain::assemble(
//!     &[InterceptorEntry::instance(audit), "sessionRefresher".into()],
//!     injector.as_ref(),
//! )?;
//! ```
//!
//! [`Injector`]: bridge_traits::Injector

mod chain;
mod interceptor;

pub use chain::InterceptorChain;
pub use interceptor::{
    ErrorHandler, Interceptor, InterceptorEntry, InterceptorFactory, SuccessHandler,
};
