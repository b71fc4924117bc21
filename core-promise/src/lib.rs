//! # Host Promise Bridge
//!
//! The host framework's side of a bridged call.
//!
//! ## Overview
//!
//! A bridged call hands the SDK's native future to [`HostRuntime::adapt`],
//! which creates exactly one [`Deferred`] for the call, drives the native
//! future on the host spawner, and settles the deferred with the same value
//! or error. Settling a deferred fires the host [`DigestCycle`] so
//! change-detection picks up whatever the caller does with the result.
//!
//! Everything downstream (the interceptor chain in particular) only relies on
//! the [`Thenable`] contract, so it works with any promise that resolves to a
//! `Result`.
//!
//! ```ignore
//! use core_promise::HostRuntime;
//!
//! let host = HostRuntime::new(spawner, digest);
//! let promise = host.adapt(sdk_future);
//! let value = promise.await?;
//! ```
//!
//! [`DigestCycle`]: bridge_traits::DigestCycle

pub mod deferred;
pub mod runtime;

pub use deferred::{defer, Abandoned, Deferred, HostPromise};
pub use runtime::{reject, when, HostRuntime, Thenable};
