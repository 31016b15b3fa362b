//! Asset key generation.
//!
//! An asset id is [`ASSET_ID_BYTES`] bytes from a [`RandomSource`], encoded as
//! URL-safe base64 without padding. Collisions are ruled out by entropy width
//! alone; storage is never consulted.

use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use thiserror::Error;

/// Number of random bytes in an asset id (256 bits).
pub const ASSET_ID_BYTES: usize = 32;

/// Extension used when the media type is not of the form `type/subtype`.
pub const FALLBACK_EXTENSION: &str = ".bin";

#[derive(Debug, Error)]
pub enum KeyError {
    /// The randomness source could not produce bytes. Never retried with a
    /// weaker source.
    #[error("Failed to obtain secure random bytes: {0}")]
    Entropy(String),
}

impl From<KeyError> for clipvault_core::AppError {
    fn from(err: KeyError) -> Self {
        clipvault_core::AppError::Internal(err.to_string())
    }
}

/// Source of random bytes for asset ids.
pub trait RandomSource: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), KeyError>;
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), KeyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| KeyError::Entropy(e.to_string()))
    }
}

/// Random asset identifier plus the file extension derived from its media type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    id: String,
    extension: String,
}

impl AssetKey {
    /// URL-safe base64 identifier (43 characters for 32 bytes).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Extension including the leading dot, e.g. `.mp4`.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Display for AssetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}", self.id, self.extension)
    }
}

/// Generates asset keys from an injected randomness source.
#[derive(Clone)]
pub struct KeyGenerator {
    source: Arc<dyn RandomSource>,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsRandom))
    }
}

impl KeyGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    pub fn generate(&self, media_type: &str) -> Result<AssetKey, KeyError> {
        let mut base = [0u8; ASSET_ID_BYTES];
        self.source.fill_bytes(&mut base)?;

        Ok(AssetKey {
            id: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(base),
            extension: media_type_to_ext(media_type),
        })
    }
}

/// Map `type/subtype` to `.subtype`; anything else to [`FALLBACK_EXTENSION`].
pub fn media_type_to_ext(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    match parts.as_slice() {
        [kind, subtype] if !kind.is_empty() && !subtype.is_empty() => format!(".{}", subtype),
        _ => FALLBACK_EXTENSION.to_string(),
    }
}
