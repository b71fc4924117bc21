//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Parse bridge:
//! - Setup-time error type shared by every crate that assembles the bridge
//! - Configuration builder wiring the backend SDK and host capabilities
//! - Named service registry (the injector interceptors are resolved from)
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! Nothing in this crate runs per call. It is consulted while the bridge is
//! being assembled; run-time failures of wrapped calls are
//! [`CallError`](bridge_traits::CallError)s, not [`Error`]s.

pub mod config;
pub mod error;
pub mod logging;
pub mod services;

pub use config::{BridgeConfig, BridgeConfigBuilder, FeatureFlags};
pub use error::{Error, Result};
pub use services::ServiceRegistry;
