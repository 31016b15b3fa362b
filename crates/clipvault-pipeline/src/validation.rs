//! Upload boundary checks, run before any pipeline work.

use clipvault_core::Config;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("Invalid file type, only {allowed:?} allowed (got {content_type:?})")]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Empty file")]
    EmptyBody,
}

/// Strip parameters (`; codecs=...`) and normalize case.
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Upload limits
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_upload_bytes: u64,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_upload_bytes: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_upload_bytes,
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| normalize_media_type(ct))
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_upload_size_bytes(),
            config.allowed_content_types().to_vec(),
        )
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Returns the normalized media type when it is accepted.
    pub fn validate_content_type(&self, content_type: &str) -> Result<String, ValidationError> {
        let media_type = normalize_media_type(content_type);

        if !self.allowed_content_types.iter().any(|ct| ct == &media_type) {
            return Err(ValidationError::UnsupportedMediaType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(media_type)
    }

    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyBody);
        }
        if size > self.max_upload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Reject a declared length early. An absent length is checked while
    /// the body is buffered instead.
    pub fn validate_declared_size(&self, declared: Option<u64>) -> Result<(), ValidationError> {
        match declared {
            Some(size) => self.validate_size(size),
            None => Ok(()),
        }
    }
}
