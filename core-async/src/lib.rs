//! Runtime abstraction layer for the Parse bridge.
//!
//! Every other crate in the workspace reaches the executor through this crate
//! instead of depending on tokio directly. The bridged promise pipeline needs
//! exactly four things from a runtime: spawning a task that drives a native
//! SDK future, one-shot channels for deferreds, async locks for the local
//! backend, and a way to block on a future from synchronous test entry points.
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep and durations
//! - `sync`: Channels and async locks
//! - `runtime`: `block_on` and runtime handles
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration};
