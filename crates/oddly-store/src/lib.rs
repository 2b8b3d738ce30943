//! # Oddly Store
//!
//! Repository seams for the platform.
//!
//! Components never assume a particular query API: each takes the store
//! traits it needs as constructor arguments, so the in-memory backend here
//! doubles as the test fake. All traits are object-safe and `Send + Sync`
//! so they can be shared as `Arc<dyn ...>` across request handlers.
//!
//! ## Layout
//!
//! - [`traits`] - one async trait per aggregate
//! - [`mem`] - `MemStore`, a `RwLock<HashMap>` implementation of all of them
//! - [`blob`] - raw byte storage behind [`blob::BlobStore`]

pub mod blob;
pub mod mem;
pub mod traits;

pub use blob::{BlobStore, MemBlobStore};
pub use mem::MemStore;
pub use traits::*;
