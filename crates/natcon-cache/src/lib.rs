//! Client-durable key-value storage for the NatCon store.
//!
//! The cart survives page reloads by writing a small JSON record into
//! whatever durable storage the client offers. This crate hides that storage
//! behind the [`KvStore`] trait and ships three backends:
//!
//! - [`MemoryStore`] - process-local map with an optional byte quota
//! - [`FileStore`] - one file per key under a directory
//! - [`UnavailableStore`] - storage that refuses every operation (private
//!   browsing, disabled storage)
//!
//! # Example
//!
//! ```rust,ignore
//! use natcon_cache::{Cache, MemoryStore};
//! use std::sync::Arc;
//!
//! let cache = Cache::new(Arc::new(MemoryStore::new()));
//!
//! // Store a value
//! cache.set("cart:session", &record).await?;
//!
//! // Retrieve a value
//! let record: Option<Record> = cache.get("cart:session").await?;
//!
//! // Delete a value
//! cache.delete("cart:session").await?;
//! ```

mod error;
mod file;
mod kv;
mod memory;

pub use error::CacheError;
pub use file::FileStore;
pub use kv::{Cache, KvStore};
pub use memory::{MemoryStore, UnavailableStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, FileStore, KvStore, MemoryStore, UnavailableStore};
}
