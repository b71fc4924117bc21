//! # Local Bridge Implementations
//!
//! In-process implementations of every bridge contract.
//!
//! ## Overview
//!
//! - `TaskSpawner` using the Tokio runtime
//! - `DigestCycle` as a no-op or as a counter for assertions
//! - `BackendSdk` as an in-memory store ([`MemoryBackend`]) providing every
//!   operation the bridge wraps: objects, queries, users and sessions, cloud
//!   functions, config, push, geolocation, analytics and files
//!
//! `MemoryBackend` is not a network client. It exists so the bridge can be
//! exercised end to end without a server, and so embedders have a working
//! default while wiring up their real SDK.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_local::{CountingDigest, MemoryBackend, TokioTaskSpawner};
//! use std::sync::Arc;
//!
//! let sdk = Arc::new(MemoryBackend::new().with_config("motd", "hello"));
//! let spawner = Arc::new(TokioTaskSpawner::new());
//! let digest = Arc::new(CountingDigest::new());
//! ```

mod backend;
mod digest;
mod spawner;

pub use backend::{CloudFunction, MemoryBackend};
pub use digest::{CountingDigest, NoopDigest};
pub use spawner::TokioTaskSpawner;
