//! # Build Output Cache
//!
//! In-process cache consulted by the scheduler before compiling. Keys are
//! fingerprints of the build input; values are opaque output bytes.
//!
//! ## Design Decisions
//!
//! - **Byte budget, not entry budget**: outputs vary from a few bytes to megabytes
//! - **Absolute TTL**: measured from the write, reads never extend it
//! - **Lazy expiry**: no sweeper task; expired entries go when read
//! - **Advisory**: `set` never fails and eviction is silent

mod build_cache;
mod entry;

pub use build_cache::{BuildCache, CacheStats};
