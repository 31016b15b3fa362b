//! Data models shared across the pipeline

mod aspect;
mod video;

pub use aspect::*;
pub use video::*;
