//! Clipvault Pipeline Library
//!
//! Sequences the upload path (validate → buffer → probe → remux → key →
//! store → persist reference) and the read path that expands persisted
//! references into short-lived URLs.

pub mod context;
pub mod error;
pub mod repository;
pub mod resolver;
pub mod temp;
pub mod upload;
pub mod validation;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use repository::{InMemoryVideoRepository, RepositoryError, VideoRepository};
pub use resolver::{UrlResolver, PRESIGNED_URL_TTL};
pub use temp::ScopedPath;
pub use upload::{UploadPipeline, UploadRequest};
pub use validation::{normalize_media_type, UploadValidator, ValidationError};
