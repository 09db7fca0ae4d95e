//! This package provides [`ContentPool`], a content-addressed object pool that deduplicates
//! heap-allocated immutable objects by logical content and observes them through weak
//! references.
//!
//! Acquiring a value hands back an [`Arc`][std::sync::Arc] strong handle; the pool records
//! only a [`Weak`][std::sync::Weak] observation, so object lifetimes stay entirely in the
//! hands of external holders. Expired observations are reclaimed opportunistically under
//! insertion pressure and on explicit cleanup calls, and the reserved capacity adapts by
//! doubling and conservative halving around a fixed floor.
//!
//! # Features
//!
//! - **Content-based deduplication**: equal content resolves to one shared object, keyed by
//!   a 64-bit content hash and content equality rather than by address.
//! - **Non-owning observation**: the pool never extends an object's lifetime; dropping the
//!   last strong handle destroys the object no matter what the pool has recorded.
//! - **Two key-contract forms**: self-describing types implement [`ContentHash`] (plus
//!   [`Eq`]); foreign types pool under externally supplied [`HashPolicy`]/[`EqPolicy`]
//!   parameters.
//! - **Adaptive capacity**: doubling growth at a high occupancy watermark, explicit
//!   one-step shrinking at a low one, with a floor of [`MIN_RESERVED_CAPACITY`] slots.
//! - **Thread-safe**: all operations take `&self` behind a readers-writer lock; concurrent
//!   acquisitions of equal content converge on a single canonical object.
//! - **Named canonical instances**: [`Registry`] layers explicit name-to-handle
//!   registration on top of a pool.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use content_pool::ContentPool;
//!
//! let pool = ContentPool::<String>::new();
//!
//! let first = pool.acquire("shared".to_string());
//! let second = pool.acquire("shared".to_string());
//!
//! // Both handles refer to one canonical object.
//! assert!(Arc::ptr_eq(&first, &second));
//!
//! // The pool only observes; dropping the handles destroys the object.
//! drop(first);
//! drop(second);
//! pool.cleanup();
//! assert!(pool.is_empty());
//! ```
//!
//! Shared across threads:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use content_pool::ContentPool;
//!
//! let pool = Arc::new(ContentPool::<String>::new());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let pool = Arc::clone(&pool);
//!         thread::spawn(move || pool.acquire("contended".to_string()))
//!     })
//!     .collect();
//!
//! let acquired: Vec<_> = handles
//!     .into_iter()
//!     .map(|handle| handle.join().unwrap())
//!     .collect();
//!
//! // Every thread ended up with the same object.
//! let winner = acquired.first().unwrap();
//! assert!(acquired.iter().all(|handle| Arc::ptr_eq(winner, handle)));
//! assert_eq!(pool.len(), 1);
//! ```

mod builder;
mod constants;
mod policy;
mod pool;
mod registry;
mod slot_table;

pub use builder::*;
pub use policy::*;
pub use pool::*;
pub use registry::*;
pub use slot_table::MIN_RESERVED_CAPACITY;
