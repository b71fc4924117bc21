//! # Method Patcher
//!
//! Wraps the backend SDK's asynchronous methods so their results come back
//! as host promises with the interceptor chain applied.
//!
//! ## Overview
//!
//! [`PatchedSdk::patch`] walks [`METHOD_REGISTRY`](registry::METHOD_REGISTRY),
//! checks that the SDK provides every listed method, and wraps each one. A
//! wrapped method called from host code:
//!
//! 1. invokes the original with an internal [`CallContext`], so whatever the
//!    SDK calls while running it is passed straight through;
//! 2. hands the native future to the host runtime, which settles one
//!    deferred with the same value or error and runs a digest;
//! 3. attaches the success and error chains and returns the result as
//!    [`Invocation::Bridged`].
//!
//! Calls made through an internal context get the original's native future
//! back as [`Invocation::Native`], untouched.
//!
//! The typed façades ([`Objects`], [`Queries`], [`Users`], ...) build
//! [`MethodCall`]s, dispatch them through the patched SDK and convert the
//! final payload.
//!
//! ```ignore
//! let patched = PatchedSdk::patch(sdk, chain, host)?;
//! let objects = Objects::new(patched.clone());
//! let saved = objects.save(SdkObject::new("GameScore").with("score", 10)).await?;
//! ```
//!
//! [`CallContext`]: bridge_traits::CallContext
//! [`Invocation::Bridged`]: bridge_traits::Invocation::Bridged
//! [`Invocation::Native`]: bridge_traits::Invocation::Native
//! [`MethodCall`]: bridge_traits::MethodCall

pub mod objects;
pub mod patcher;
pub mod query;
pub mod registry;
pub mod services;
pub mod user;

pub use objects::Objects;
pub use patcher::{patch_methods, CallFuture, PatchedMethod, PatchedSdk, PatchedSlots};
pub use query::Queries;
pub use registry::{MethodSet, METHOD_REGISTRY};
pub use services::{Analytics, AppConfig, Cloud, Files, GeoPoints, Push};
pub use user::{Sessions, Users};
