//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `bridge-local`). Host applications
//! can depend on `parse-bridge-workspace` and enable the documented features
//! without needing to wire each crate individually.

#[cfg(any(feature = "service", feature = "local-defaults"))]
pub use core_service as service;
