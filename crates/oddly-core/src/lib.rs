//! # Oddly Core
//!
//! Shared foundation for the oddly-brilliant bounty platform:
//!
//! - **Identifiers**: typed UUID newtypes for every aggregate
//! - **Entity model**: challenges, contributions, manifests, payouts
//! - **Content hashing**: SHA-256 content addressing for files and cache keys
//! - **Errors**: the single error taxonomy all domain crates raise
//!
//! Domain crates (`oddly-ledger`, `oddly-compliance`, `oddly-ethics`,
//! `oddly-safety`, `oddly-audit`) depend on this crate and on the
//! repository traits in `oddly-store`; they never depend on each other's
//! internals.

pub mod error;
pub mod hash;
pub mod model;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use hash::ContentHash;
pub use model::*;
pub use types::*;
