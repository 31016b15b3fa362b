//! Storage key and persisted reference scheme.

use crate::keys::AssetKey;
use clipvault_core::AspectClass;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use thiserror::Error;

/// Separator between location and key in a persisted reference.
pub const REFERENCE_SEPARATOR: char = ',';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("invalid video reference format: missing ',' separator")]
    MissingSeparator,

    #[error("invalid video reference format: empty {0}")]
    EmptyComponent(&'static str),

    #[error("storage location {0:?} contains the reference separator")]
    SeparatorInLocation(String),
}

impl From<ReferenceError> for clipvault_core::AppError {
    fn from(err: ReferenceError) -> Self {
        clipvault_core::AppError::InvalidReference(err.to_string())
    }
}

/// Object-store key for an asset: `{aspect}/{asset_key}`.
pub fn compute_key(aspect: AspectClass, asset_key: &AssetKey) -> String {
    format!("{}/{}", aspect, asset_key)
}

/// Durable pointer to stored media, persisted as `"{location},{key}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference {
    location: String,
    key: String,
}

impl VideoReference {
    /// Pair a location with a key.
    ///
    /// The location may not contain the separator; the key may, because
    /// parsing keeps everything after the first separator.
    pub fn compose(
        location: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, ReferenceError> {
        let location = location.into();
        let key = key.into();

        if location.contains(REFERENCE_SEPARATOR) {
            return Err(ReferenceError::SeparatorInLocation(location));
        }
        if location.is_empty() {
            return Err(ReferenceError::EmptyComponent("location"));
        }
        if key.is_empty() {
            return Err(ReferenceError::EmptyComponent("key"));
        }

        Ok(Self { location, key })
    }

    /// Split a persisted reference on the first separator.
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        let (location, key) = reference
            .split_once(REFERENCE_SEPARATOR)
            .ok_or(ReferenceError::MissingSeparator)?;

        if location.is_empty() {
            return Err(ReferenceError::EmptyComponent("location"));
        }
        if key.is_empty() {
            return Err(ReferenceError::EmptyComponent("key"));
        }

        Ok(Self {
            location: location.to_string(),
            key: key.to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for VideoReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}{}", self.location, REFERENCE_SEPARATOR, self.key)
    }
}

impl FromStr for VideoReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
