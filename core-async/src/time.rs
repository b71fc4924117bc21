//! Time-related abstractions.
//!
//! ```rust
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     sleep(Duration::from_millis(5)).await;
//! }
//! ```

pub use std::time::{Duration, Instant};
pub use tokio::time::{sleep, timeout};
