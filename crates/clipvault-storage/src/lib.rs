//! Clipvault Storage Library
//!
//! Object-store abstraction for uploaded videos, plus the two pieces of the
//! key scheme that decide where an asset lands and how it is referenced.
//!
//! # Storage key format
//!
//! Keys are namespaced by aspect class: `{aspect}/{asset_id}{ext}`, for example
//! `landscape/3q2-7w...Qk.mp4`. The asset id is 32 random bytes in URL-safe
//! base64 without padding.
//!
//! # Persisted reference format
//!
//! The video record stores `"{location},{key}"` in a single text column, where
//! `location` is the bucket (S3) or asset-root name (local). Parsing splits on
//! the first comma, so locations can never contain one.

#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;

pub mod factory;
pub mod keys;
pub mod reference;
pub mod traits;

// Re-export commonly used types
pub use clipvault_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{AssetKey, KeyError, KeyGenerator, OsRandom, RandomSource};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reference::{compute_key, ReferenceError, VideoReference, REFERENCE_SEPARATOR};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
