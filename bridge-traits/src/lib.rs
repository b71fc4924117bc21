//! # Bridge Traits
//!
//! Contracts between the Parse bridge core and the two systems it connects.
//!
//! ## Overview
//!
//! The bridge sits between a backend SDK (objects, queries, users, cloud
//! functions, ...) that hands out its own native futures, and a host framework
//! that owns the promise type, the digest cycle, and the dependency injector.
//! Neither side is implemented here. This crate only defines the shapes the
//! core needs from each side:
//!
//! ### Backend SDK
//! - [`BackendSdk`](sdk::BackendSdk) - Initialization plus one
//!   [`MethodTable`](sdk::MethodTable) per [`EntityType`](sdk::EntityType)
//! - [`NativeMethod`](sdk::NativeMethod) - A single SDK operation returning a
//!   [`NativeFuture`](sdk::NativeFuture)
//! - [`CallContext`](sdk::CallContext) / [`Dispatch`](sdk::Dispatch) - How an
//!   SDK method calls back into other (possibly wrapped) methods
//!
//! ### Host Framework
//! - [`TaskSpawner`](host::TaskSpawner) - Drives native futures to completion
//! - [`DigestCycle`](host::DigestCycle) - Change-detection trigger fired when a
//!   bridged promise settles
//! - [`Injector`](host::Injector) - Named service lookup used to resolve
//!   interceptors
//!
//! ### Values
//! - [`SdkObject`](model::SdkObject), [`Query`](model::Query),
//!   [`SdkFile`](model::SdkFile), [`GeoPoint`](model::GeoPoint)
//! - [`Payload`](model::Payload) - The dynamic result flowing through the
//!   interceptor chain
//! - [`Receiver`](model::Receiver) - The object a method was invoked on
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Native rejections are [`SdkError`](error::SdkError) values carrying the
//! SDK's numeric error code. Once a rejection enters the interceptor chain it
//! becomes a [`CallError`](error::CallError), which additionally records the
//! receiver the failing call was made on.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so bridge implementations can be shared
//! freely across spawned tasks.

pub mod error;
pub mod host;
pub mod model;
pub mod sdk;
pub mod time;

pub use error::{CallError, CallResult, SdkError};

// Re-export commonly used types
pub use host::{DigestCycle, Injector, TaskSpawner};
pub use model::{Constraint, GeoPoint, Payload, Query, Receiver, SdkFile, SdkObject, SortOrder};
pub use sdk::{
    BackendSdk, BridgedFuture, CallContext, Dispatch, DispatchMode, EntityType, Invocation,
    MethodCall, MethodKind, MethodTable, NativeFuture, NativeMethod,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SteppingClock, SystemClock};
