//! Synchronization primitives.
//!
//! Async-aware locks and channels re-exported from `tokio::sync`. All of them
//! are `Send + Sync` and can be shared across tasks.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{oneshot, Mutex};
//!
//! async fn example() {
//!     let mutex = Mutex::new(42);
//!     *mutex.lock().await += 1;
//!
//!     let (tx, rx) = oneshot::channel();
//!     tx.send(*mutex.lock().await).unwrap();
//!     assert_eq!(rx.await.unwrap(), 43);
//! }
//! ```

pub use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
